pub mod client;


pub use client::HttpProvisioningApi;

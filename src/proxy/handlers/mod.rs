// API endpoint handlers

pub mod resource;

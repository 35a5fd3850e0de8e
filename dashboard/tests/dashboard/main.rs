mod admin;
mod auth;
mod company;
mod driver;
mod freights;

mod models;
mod repositories;
mod search;
mod speech;

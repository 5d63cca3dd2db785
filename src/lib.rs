pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod media;
pub mod repository;
pub mod roster;
pub mod service;
pub mod web;

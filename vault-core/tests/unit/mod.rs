mod audit;
mod crypto;
mod events;
mod keystore;

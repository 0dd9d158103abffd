mod cascade;
mod drain;
mod timeout;

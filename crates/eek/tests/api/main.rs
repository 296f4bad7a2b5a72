mod helper;

mod budgets;
mod cache;
mod concurrency;
mod language;
mod lifecycle;
mod properties;
mod scenarios;
mod validation;

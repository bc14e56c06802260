mod drain_test;
mod helpers;

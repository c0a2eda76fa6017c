mod faults;
mod registry;
mod sqlite;

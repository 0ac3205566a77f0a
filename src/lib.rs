// vendor product feeds into the shared catalog table, one run per vendor csv

pub mod modules;

//! Unit test modules.

mod csv_export_test;
mod store_test;
mod tcx_export_test;

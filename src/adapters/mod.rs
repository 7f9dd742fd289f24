// Adapters layer: concrete implementations of the domain ports (http, storage, files)

pub mod csv_report;
pub mod http_ephemeris;
pub mod local_file;
pub mod sled_store;

pub use csv_report::ranking_to_csv;
pub use http_ephemeris::HttpEphemerisProvider;
pub use local_file::LocalStorage;
pub use sled_store::SledStore;

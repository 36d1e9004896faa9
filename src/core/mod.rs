/// Core functionality modules
///
/// Parsing Talon files, loading them into the store, searching
/// and building filter facets.

pub mod command_parser;
pub mod facets;
pub mod importer;
pub mod list_parser;
pub mod scanner;
pub mod searcher;

pub use command_parser::CommandParser;
pub use facets::{FacetBuilder, FilterValues};
pub use importer::{ImportMode, ImportSummary, Importer, SourceFile};
pub use list_parser::ListParser;
pub use scanner::ScanReport;
pub use searcher::{SearchOptions, SearchScope, Searcher};

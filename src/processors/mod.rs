//! Geometric segmentation of scoresheet photos.
//!
//! The segmentation stages run in a fixed order, each consuming the
//! previous stage's output:
//!
//! * `geometry` - Rectangle primitive shared by every stage
//! * `projection` - Ink-density profiles and smoothing
//! * `table_locator` - Finding the notation table in the photo
//! * `column_detector` - Candidate column boundaries within the table
//! * `column_selector` - Choosing the run of boundaries that is the move grid

mod column_detector;
mod column_selector;
mod geometry;
pub mod projection;
mod table_locator;

pub use column_detector::{ColumnBoundaryDetector, ColumnDetectorConfig};
pub use column_selector::{
    ColumnInfo, ColumnSelection, ColumnSequenceSelector, SelectionMethod, SequenceSelectorConfig,
};
pub use geometry::Region;
pub use table_locator::{
    LocateStrategy, LocatedTable, TableBoundaryLocator, TableLocatorConfig,
};

pub mod gff;
pub mod strand;
pub mod transcript;

// re-export for cleaner imports
pub use self::gff::GffLine;
pub use self::strand::Strand;
pub use self::transcript::{RelativeMetrics, Segment, Transcript};

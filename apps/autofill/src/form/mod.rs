// Form structure: extraction of field descriptors, label resolution, and
// application of fill assignments back onto the document.

pub mod applier;
pub mod extractor;
pub mod labels;

pub mod batch;
pub mod dedup;

pub use batch::{
    batch_file_name, label_width, split_batches, Batch, ContactLabeler, PerFileLimit,
    CARD_EXTENSION,
};
pub use dedup::dedup_preserving_order;

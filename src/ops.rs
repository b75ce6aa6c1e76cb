pub mod box_it;
pub mod finalize;
pub mod ref_count;
pub mod take;

//! Data structures shared across the pipeline.
//!
//! - [`jobs`]: one conversion job per input directory
//! - [`descriptors`]: the YAML files that sit next to a rip

pub mod descriptors;
pub mod jobs;

pub use descriptors::{
    ConversionDictionary, DescriptorError, DescriptorResult, ImageRef, MetaDescriptor,
    TagAssignment, TagList, TargetName,
};
pub use jobs::{
    required_files, ConversionJob, JobError, JobFlags, SkipReason, CUE_FILE, META_FILE, TAGS_FILE,
    WAV_FILE,
};

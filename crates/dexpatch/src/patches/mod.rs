//! Built-in patches.

pub mod fingerprints;
mod shared_resource_ids;
mod video_information;
mod wide_search_bar;

use crate::patch::{Patch, PatchRunner};

pub use shared_resource_ids::{SHARED_RESOURCES, SharedResourceIds};
pub use video_information::VideoInformation;
pub use wide_search_bar::WideSearchBar;

/// Every built-in patch, in registration order
pub fn all_patches() -> Vec<Box<dyn Patch>> {
    vec![
        Box::new(SharedResourceIds),
        Box::new(WideSearchBar),
        Box::new(VideoInformation),
    ]
}

/// A runner with every built-in patch registered
pub fn default_runner() -> PatchRunner {
    let mut runner = PatchRunner::new();
    for patch in all_patches() {
        runner.add(patch);
    }
    runner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let runner = default_runner();
        assert_eq!(
            runner.order().unwrap(),
            vec![
                SharedResourceIds::NAME,
                WideSearchBar::NAME,
                VideoInformation::NAME
            ]
        );
    }
}

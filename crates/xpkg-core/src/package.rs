//! Decoded package contents

use crate::meta::PackageMeta;
use crate::resource::Object;

/// A decoded package: meta objects plus body objects, in stream order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    meta: Vec<PackageMeta>,
    objects: Vec<Object>,
}

impl Package {
    pub fn new(meta: Vec<PackageMeta>, objects: Vec<Object>) -> Self {
        Self { meta, objects }
    }

    /// Meta objects found in the stream
    pub fn meta(&self) -> &[PackageMeta] {
        &self.meta
    }

    /// Body objects found in the stream
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn into_parts(self) -> (Vec<PackageMeta>, Vec<Object>) {
        (self.meta, self.objects)
    }
}

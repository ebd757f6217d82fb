//! Browser-side network services.

pub(crate) mod api;

//! Listing window query parsing.

use salvo::oapi::extract::QueryParam;

use trellis_app::pagination::Page;

pub(crate) trait PageQueryExt {
    fn into_page(self, size: QueryParam<u32, false>) -> Page;
}

impl PageQueryExt for QueryParam<u32, false> {
    fn into_page(self, size: QueryParam<u32, false>) -> Page {
        Page::new(self.into_inner(), size.into_inner())
    }
}

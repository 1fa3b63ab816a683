/// Trigger for loading the next page as the selection nears the end of the list.
///
/// The sentinel sits `margin` rows before the last item. Moving the selection
/// into that zone asks for one more page, provided the listing has more and
/// nothing is loading yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSentinel {
    pub margin: usize,
}

impl Default for ScrollSentinel {
    fn default() -> Self {
        Self { margin: 3 }
    }
}

impl ScrollSentinel {
    pub fn new(margin: usize) -> Self {
        Self { margin }
    }

    pub fn should_load_more(
        &self,
        selected: Option<usize>,
        total: usize,
        has_more: bool,
        is_loading: bool,
    ) -> bool {
        if !has_more || is_loading || total == 0 {
            return false;
        }
        let Some(selected) = selected else {
            return false;
        };
        selected + self.margin >= total.saturating_sub(1)
    }
}

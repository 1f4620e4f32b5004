//! Style class identifiers applied to view elements. Passed at
//! construction so embedders can retheme without global state.

#[derive(Clone, Debug)]
pub struct StyleConfig {
    pub container: String,
    pub row: String,
    pub row_even: String,
    pub row_odd: String,
    pub row_selected: String,
    pub reorder_handle: String,
    pub drag_indicator: String,
    pub drag_ghost: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            container: "collection-view".into(),
            row: "collection-view__item".into(),
            row_even: "collection-view__item--even".into(),
            row_odd: "collection-view__item--odd".into(),
            row_selected: "collection-view__item--selected".into(),
            reorder_handle: "collection-view__reorder-handle".into(),
            drag_indicator: "collection-view__drag-indicator".into(),
            drag_ghost: "collection-view__drag-ghost".into(),
        }
    }
}

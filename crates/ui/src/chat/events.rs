/// Emitted when the user submits the draft held by the shared composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submit;

/// Emitted when the sidebar's own collapse button is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarToggleClicked;

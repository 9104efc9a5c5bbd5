//! Sidebar navigation: the fixed route table and active-entry matching.

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub route: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Sidebar entries in display order.
pub const ROUTES: [Route; 5] = [
    Route {
        route: "/",
        label: "Home",
        icon: "home",
    },
    Route {
        route: "/folders",
        label: "Folders",
        icon: "folder",
    },
    Route {
        route: "/explorer",
        label: "Explorer",
        icon: "compass",
    },
    Route {
        route: "/search",
        label: "Search",
        icon: "search",
    },
    Route {
        route: "/upload",
        label: "Upload",
        icon: "upload",
    },
];

impl Route {
    /// Exact match only; `/folders/x` does not activate `/folders`.
    pub fn is_active(&self, current: &str) -> bool {
        self.route == current
    }
}

/// The entry matching `current`, if any.
pub fn active_route(current: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.is_active(current))
}

/// Render the sidebar as text lines, marking the active entry.
pub fn render_sidebar(current: Option<&str>) -> Vec<String> {
    ROUTES
        .iter()
        .map(|r| {
            let marker = if current.is_some_and(|c| r.is_active(c)) {
                '>'
            } else {
                ' '
            };
            format!("{} {:<10} {:<9} [{}]", marker, r.label, r.route, r.icon)
        })
        .collect()
}

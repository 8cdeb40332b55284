/// Top-level views. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Stocks,
    Portfolio,
    History,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Stocks => "Stocks",
            Section::Portfolio => "Portfolio",
            Section::History => "Trade History",
        }
    }
}

/// One activation of a section. Loads carry their ticket back so results
/// arriving after the user has moved on can be discarded instead of
/// painting over the wrong view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub section: Section,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not authenticated; the login view preempts everything.
    Login,
    /// Section is now active; load its data under this ticket.
    Activated(Ticket),
}

#[derive(Debug)]
pub struct ViewRouter {
    active: Section,
    generation: u64,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            active: Section::Dashboard,
            generation: 0,
        }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    /// Make `section` the active view. Unauthenticated activation routes
    /// to login instead; every granted activation starts a new generation,
    /// so re-activating the same section also invalidates older tickets.
    pub fn activate(&mut self, section: Section, authenticated: bool) -> Route {
        if !authenticated {
            return Route::Login;
        }

        self.active = section;
        self.generation += 1;
        Route::Activated(Ticket {
            section,
            generation: self.generation,
        })
    }

    /// Whether a load ticket still refers to the active view.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.section == self.active && ticket.generation == self.generation
    }
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_the_dashboard() {
        let router = ViewRouter::new();
        assert_eq!(router.active(), Section::Dashboard);
    }

    #[test]
    fn unauthenticated_activation_routes_to_login() {
        let mut router = ViewRouter::new();
        assert_eq!(router.activate(Section::Portfolio, false), Route::Login);
        // The refused activation must not change the active view.
        assert_eq!(router.active(), Section::Dashboard);
    }

    #[test]
    fn activation_yields_a_current_ticket() {
        let mut router = ViewRouter::new();
        let ticket = match router.activate(Section::Stocks, true) {
            Route::Activated(ticket) => ticket,
            Route::Login => panic!("expected activation"),
        };
        assert_eq!(ticket.section, Section::Stocks);
        assert!(router.is_current(ticket));
    }

    #[test]
    fn switching_sections_invalidates_older_tickets() {
        let mut router = ViewRouter::new();
        let stocks = match router.activate(Section::Stocks, true) {
            Route::Activated(ticket) => ticket,
            Route::Login => panic!("expected activation"),
        };
        let history = match router.activate(Section::History, true) {
            Route::Activated(ticket) => ticket,
            Route::Login => panic!("expected activation"),
        };

        assert!(!router.is_current(stocks));
        assert!(router.is_current(history));
    }

    #[test]
    fn reactivating_the_same_section_invalidates_the_previous_ticket() {
        let mut router = ViewRouter::new();
        let first = match router.activate(Section::Portfolio, true) {
            Route::Activated(ticket) => ticket,
            Route::Login => panic!("expected activation"),
        };
        let second = match router.activate(Section::Portfolio, true) {
            Route::Activated(ticket) => ticket,
            Route::Login => panic!("expected activation"),
        };

        assert!(!router.is_current(first));
        assert!(router.is_current(second));
    }
}

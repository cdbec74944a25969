#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Tab {
    Overview,
    Dashboard,
    Readings,
    Entry,
    Learn,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Overview,
        Tab::Dashboard,
        Tab::Readings,
        Tab::Entry,
        Tab::Learn,
        Tab::Settings,
    ];

    pub fn label(&self) -> &str {
        match self {
            Tab::Overview => "Overview",
            Tab::Dashboard => "Dashboard",
            Tab::Readings => "Readings",
            Tab::Entry => "Entry",
            Tab::Learn => "Learn",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Overview => 0,
            Tab::Dashboard => 1,
            Tab::Readings => 2,
            Tab::Entry => 3,
            Tab::Learn => 4,
            Tab::Settings => 5,
        }
    }

    pub fn from_index(i: usize) -> Option<Tab> {
        Tab::ALL.get(i).copied()
    }

    pub fn next(&self) -> Tab {
        let idx = (self.index() + 1) % Tab::ALL.len();
        Tab::ALL[idx]
    }

    pub fn prev(&self) -> Tab {
        let idx = if self.index() == 0 {
            Tab::ALL.len() - 1
        } else {
            self.index() - 1
        };
        Tab::ALL[idx]
    }
}

pub mod dashboard;
pub mod entry;
pub mod learn;
pub mod overview;
pub mod readings;
pub mod settings;

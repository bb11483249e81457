use chrono::NaiveDate;

use crate::{
    import::ImportSource,
    manager::HikingDayManager,
    model::{HikingDay, Location, ViewMode, noon_local},
};

/// A user gesture forwarded to the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Add { date: NaiveDate, location: Location },
    Remove { id: String },
    Refresh { id: String },
    RefreshAll,
    Import { source: ImportSource },
    ClearAll,
    SwitchView { mode: ViewMode },
}

/// Owns the active projection and the manager behind it.
///
/// Renderers borrow [`ViewShell::hiking_days`]; no business rules live here.
#[derive(Debug)]
pub struct ViewShell {
    manager: HikingDayManager,
    mode: ViewMode,
}

impl ViewShell {
    /// Restore the stored view mode and run the manager's initial load.
    pub async fn open(mut manager: HikingDayManager) -> Self {
        let mode = manager.storage().load_view_mode();
        manager.initialize().await;
        tracing::debug!(%mode, days = manager.hiking_days().len(), "view shell opened");
        Self { manager, mode }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn hiking_days(&self) -> &[HikingDay] {
        self.manager.hiking_days()
    }

    pub fn manager(&self) -> &HikingDayManager {
        &self.manager
    }

    pub async fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Add { date, location } => {
                self.manager.add(noon_local(date), location).await;
            }
            Intent::Remove { id } => {
                self.manager.remove(&id);
            }
            Intent::Refresh { id } => {
                self.manager.refresh_weather(&id).await;
            }
            Intent::RefreshAll => {
                self.manager.refresh_all().await;
            }
            Intent::Import { source } => {
                self.manager.import(&source).await;
            }
            Intent::ClearAll => self.manager.clear_all(),
            Intent::SwitchView { mode } => self.switch_view(mode),
        }
    }

    fn switch_view(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.manager.storage().save_view_mode(mode);
    }
}

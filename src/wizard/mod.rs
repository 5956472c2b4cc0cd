//! Three-step booking wizard: search, select a car, enter details.
//!
//! Each step hands an immutable snapshot to the next. Going back hides a
//! step without discarding its state; restarting after a confirmed booking
//! clears only the selected car so the next search starts from the last one.

pub mod details;
pub mod search;
pub mod select_car;

pub use details::DetailsStep;
pub use search::SearchForm;
pub use select_car::load_vehicle_options;

use crate::errors::AppError;
use crate::models::{SearchState, SelectedCar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Search,
    SelectCar,
    Details,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Search => 1,
            WizardStep::SelectCar => 2,
            WizardStep::Details => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    search: Option<SearchState>,
    car: Option<SelectedCar>,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Search,
            search: None,
            car: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn car(&self) -> Option<&SelectedCar> {
        self.car.as_ref()
    }

    /// Form for step 1, prefilled from the last search when there is one.
    pub fn search_form(&self) -> SearchForm {
        self.search
            .as_ref()
            .map(SearchForm::from_state)
            .unwrap_or_default()
    }

    /// Validates the search form and moves to vehicle selection.
    pub fn submit_search(&mut self, form: SearchForm) -> Result<&SearchState, AppError> {
        if self.step != WizardStep::Search {
            return Err(self.rejected("submit a search"));
        }
        let state = form.into_state()?;
        tracing::debug!(from = %state.from_city_name, to = %state.to_city_name, "search submitted");

        self.step = WizardStep::SelectCar;
        Ok(&*self.search.insert(state))
    }

    pub fn select_car(&mut self, car: SelectedCar) -> Result<(), AppError> {
        if self.step != WizardStep::SelectCar || self.search.is_none() {
            return Err(self.rejected("select a car"));
        }
        tracing::debug!(car = %car.name, price = car.price, "car selected");
        self.car = Some(car);
        self.step = WizardStep::Details;
        Ok(())
    }

    /// Snapshots the details step works from. Both must exist.
    pub fn details_context(&self) -> Result<(&SearchState, &SelectedCar), AppError> {
        match (self.step, self.search.as_ref(), self.car.as_ref()) {
            (WizardStep::Details, Some(search), Some(car)) => Ok((search, car)),
            _ => Err(self.rejected("enter booking details")),
        }
    }

    pub fn back(&mut self) -> Result<WizardStep, AppError> {
        self.step = match self.step {
            WizardStep::Details => WizardStep::SelectCar,
            WizardStep::SelectCar => WizardStep::Search,
            WizardStep::Search => return Err(self.rejected("go back")),
        };
        Ok(self.step)
    }

    /// After a confirmed booking: back to search, selected car cleared.
    pub fn restart(&mut self) -> Result<(), AppError> {
        if self.step != WizardStep::Details {
            return Err(self.rejected("restart"));
        }
        self.car = None;
        self.step = WizardStep::Search;
        Ok(())
    }

    fn rejected(&self, action: &str) -> AppError {
        AppError::InvalidTransition(format!(
            "cannot {action} from step {}",
            self.step.number()
        ))
    }
}

//! Services module - persistence operations over surveys

pub mod survey_service;

pub use survey_service::SurveyService;

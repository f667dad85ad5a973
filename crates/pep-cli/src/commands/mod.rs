pub mod audit;
pub mod batch;
pub mod dispatch;
pub mod grade;
pub mod history;
pub mod republish;
pub mod run;
pub mod show;

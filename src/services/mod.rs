pub mod ai_service;
pub mod assistant_service;
pub mod export_service;
pub mod grading_service;
pub mod render_service;
pub mod session_service;

pub mod feedback;
pub mod trip;

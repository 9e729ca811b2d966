use serde::{Deserialize, Serialize};

pub type TaskId = i64;

// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn toggled(self) -> Status {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Completed => "Completed",
        }
    }

    /// Label of the control that flips a task into the other status.
    pub fn action_label(self) -> &'static str {
        match self {
            Status::Pending => "Mark Completed",
            Status::Completed => "Mark Pending",
        }
    }
}

// Task struct, shared by the bootstrap resource and the persisted slots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub date: String,
    pub status: Status,
}

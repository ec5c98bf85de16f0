//! Offline transcription through the batch jobs API

mod client;
mod messages;

pub use client::{BatchClient, PollOptions};
pub use messages::{
    JobOptions, JobRequest, JobResults, JobState, JobStatus, JobSubmission, ResultSegment,
    ResultWord, FAILURE_STATUSES, SUCCESS_STATUS,
};

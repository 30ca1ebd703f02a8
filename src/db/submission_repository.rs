use crate::db::models::Submission;
use crate::errors::Error;
use crate::schema::submissions;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// Repository for submission records in the SQLite database
pub struct SubmissionRepository<'a> {
    /// Database connection
    pub conn: &'a mut SqliteConnection,
}

impl<'a> SubmissionRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        SubmissionRepository { conn }
    }

    /// Inserts the row or replaces the existing row with the same id
    pub fn upsert(&mut self, submission: &Submission) -> Result<(), Error> {
        diesel::replace_into(submissions::table)
            .values(submission)
            .execute(self.conn)?;
        Ok(())
    }

    /// Retrieves a submission by id
    ///
    /// # Returns
    ///
    /// `None` if no row has this id
    pub fn get(&mut self, submission_id: &str) -> Result<Option<Submission>, Error> {
        let found = submissions::table
            .find(submission_id)
            .first::<Submission>(self.conn)
            .optional()?;
        Ok(found)
    }

    /// Deletes `SUCCESS` and `FAILURE` rows last updated before `cutoff`
    ///
    /// # Arguments
    ///
    /// * `cutoff` - Timestamp formatted with [`crate::db::format_timestamp`]
    pub fn delete_finished_before(&mut self, cutoff: &str) -> Result<usize, Error> {
        let deleted = diesel::delete(
            submissions::table
                .filter(submissions::updated_at.lt(cutoff))
                .filter(submissions::status.eq_any(["SUCCESS", "FAILURE"])),
        )
        .execute(self.conn)?;
        Ok(deleted)
    }
}

// src/application/challenge_catalogue.rs
use crate::application::ChallengeRepository;
use crate::domain::{Challenge, ChallengeForm, DomainError, FileResource, FlagOutcome};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Category,
    Difficulty,
    CreatedAt,
    Solved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for ChallengeSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl ChallengeSort {
    /// Clicking a column header: same column flips direction, a new column starts ascending
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            let direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
            Self { field, direction }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }

    fn compare(&self, a: &Challenge, b: &Challenge) -> Ordering {
        let text = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase());
        let ordering = match self.field {
            SortField::Title => text(&a.title, &b.title),
            SortField::Category => text(&a.category, &b.category),
            SortField::Difficulty => text(&a.difficulty, &b.difficulty),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Solved => a.solved.cmp(&b.solved),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

pub fn sort_challenges(challenges: &mut [Challenge], sort: ChallengeSort) {
    challenges.sort_by(|a, b| sort.compare(a, b));
}

pub struct ChallengeCatalogue<R: ChallengeRepository> {
    repository: R,
}

impl<R: ChallengeRepository> ChallengeCatalogue<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn list(&mut self, sort: ChallengeSort) -> Result<Vec<Challenge>, DomainError> {
        let mut challenges = self.repository.list_challenges()?;
        sort_challenges(&mut challenges, sort);
        Ok(challenges)
    }

    pub fn get(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.repository.get_challenge(id)
    }

    /// Creates a challenge and attaches `pending_files`.
    ///
    /// If an upload fails the freshly created challenge is deleted again. That
    /// cleanup is best effort: its own failure is only logged.
    #[instrument(level = "debug", skip(self, form), fields(title = %form.title))]
    pub fn create(
        &mut self,
        form: &ChallengeForm,
        pending_files: &[PathBuf],
    ) -> Result<Challenge, DomainError> {
        let form = form.validated()?;
        let created = self.repository.create_challenge(&form)?;
        info!(challenge_id = created.id, "Created challenge");

        if pending_files.is_empty() {
            return Ok(created);
        }

        match self.upload_all(created.id, pending_files) {
            Ok(files) => {
                let mut with_files = form.clone();
                with_files.resources.files = files;
                self.repository.update_challenge(created.id, &with_files)
            }
            Err(e) => {
                warn!(challenge_id = created.id, error = %e, "Upload failed, removing challenge");
                if let Err(cleanup) = self.repository.delete_challenge(created.id) {
                    warn!(challenge_id = created.id, error = %cleanup, "Compensating delete failed");
                }
                Err(e)
            }
        }
    }

    fn upload_all(&mut self, id: i64, paths: &[PathBuf]) -> Result<Vec<FileResource>, DomainError> {
        paths
            .iter()
            .map(|path| self.repository.upload_file(id, path))
            .collect()
    }

    pub fn update(&mut self, id: i64, form: &ChallengeForm) -> Result<Challenge, DomainError> {
        let form = form.validated()?;
        let updated = self.repository.update_challenge(id, &form)?;
        info!(challenge_id = id, "Updated challenge");
        Ok(updated)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), DomainError> {
        self.repository.delete_challenge(id)?;
        info!(challenge_id = id, "Deleted challenge");
        Ok(())
    }

    pub fn toggle_solved(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.repository.toggle_solved(id)
    }

    pub fn check_flag(&mut self, id: i64, flag: &str) -> Result<FlagOutcome, DomainError> {
        let outcome = self.repository.check_flag(id, flag)?;
        debug!(challenge_id = id, ?outcome, "Checked flag");
        Ok(outcome)
    }

    pub fn upload_file(&mut self, id: i64, path: &Path) -> Result<FileResource, DomainError> {
        self.repository.upload_file(id, path)
    }

    /// Downloads an attachment into `dest` and returns the number of bytes written
    pub fn download_file(&mut self, id: i64, filename: &str, dest: &Path) -> Result<usize, DomainError> {
        let bytes = self.repository.download_file(id, filename)?;
        std::fs::write(dest, &bytes)
            .map_err(|e| DomainError::Io(format!("{}: {}", dest.display(), e)))?;
        info!(challenge_id = id, filename, dest = %dest.display(), "Downloaded file");
        Ok(bytes.len())
    }

    pub fn delete_file(&mut self, id: i64, filename: &str) -> Result<(), DomainError> {
        self.repository.delete_file(id, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::util::testing::{challenge, BackendCall, MockBackend};

    fn form() -> ChallengeForm {
        ChallengeForm {
            title: "baby-rop".to_string(),
            description: "ret2win".to_string(),
            category: "Pwn".to_string(),
            difficulty: "Easy".to_string(),
            ..ChallengeForm::default()
        }
    }

    #[test]
    fn given_invalid_form_when_creating_then_no_request_is_made() {
        let mut catalogue = ChallengeCatalogue::new(MockBackend::builder().build());
        let mut f = form();
        f.category.clear();

        let result = catalogue.create(&f, &[]);

        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MissingField("category")))
        ));
        assert!(catalogue.repository().calls().is_empty());
    }

    #[test]
    fn given_pending_files_when_creating_then_uploads_and_records_resources() {
        let mut catalogue = ChallengeCatalogue::new(MockBackend::builder().with_next_id(3).build());

        let created = catalogue
            .create(&form(), &[PathBuf::from("/tmp/vuln"), PathBuf::from("/tmp/libc.so")])
            .unwrap();

        assert_eq!(created.resources.files.len(), 2);
        assert_eq!(created.resources.files[0].original_name, "vuln");
        assert!(catalogue
            .repository()
            .calls()
            .contains(&BackendCall::UpdateChallenge(3)));
    }

    #[test]
    fn given_failing_upload_when_creating_then_challenge_is_deleted_again() {
        let backend = MockBackend::builder()
            .with_next_id(8)
            .failing(BackendCall::UploadFile(0))
            .build();
        let mut catalogue = ChallengeCatalogue::new(backend);

        let result = catalogue.create(&form(), &[PathBuf::from("/tmp/vuln")]);

        assert!(result.is_err());
        assert!(catalogue
            .repository()
            .calls()
            .contains(&BackendCall::DeleteChallenge(8)));
        assert!(catalogue.list(ChallengeSort::default()).unwrap().is_empty());
    }

    #[test]
    fn given_challenges_when_sorting_by_title_then_case_insensitive() {
        let mut items = vec![challenge(1, "zeta", false), challenge(2, "Alpha", true)];
        sort_challenges(
            &mut items,
            ChallengeSort {
                field: SortField::Title,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(items[0].title, "Alpha");
    }

    #[test]
    fn given_default_sort_when_listing_then_newest_first() {
        let backend = MockBackend::builder()
            .with_challenge(challenge(1, "old", false))
            .with_challenge(challenge(2, "new", false))
            .build();
        let mut catalogue = ChallengeCatalogue::new(backend);

        let listed = catalogue.list(ChallengeSort::default()).unwrap();

        assert_eq!(listed[0].id, 2);
    }

    #[test]
    fn given_same_column_when_toggling_sort_then_direction_flips() {
        let sort = ChallengeSort::default().toggled(SortField::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);
        let sort = sort.toggled(SortField::Solved);
        assert_eq!(sort.field, SortField::Solved);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn given_flag_when_checking_then_returns_backend_verdict() {
        let backend = MockBackend::builder()
            .with_challenge(challenge(4, "crypto", false))
            .with_flag(4, "FLAG{ok}")
            .build();
        let mut catalogue = ChallengeCatalogue::new(backend);

        assert_eq!(catalogue.check_flag(4, "FLAG{ok}").unwrap(), FlagOutcome::Correct);
        assert!(matches!(
            catalogue.check_flag(4, "nope").unwrap(),
            FlagOutcome::Incorrect { .. }
        ));
    }

    #[test]
    fn given_attachment_when_downloading_then_writes_bytes_to_destination() {
        let backend = MockBackend::builder()
            .with_challenge(challenge(4, "forensics", false))
            .with_file(4, "dump.pcap", b"pcap-bytes".to_vec())
            .build();
        let mut catalogue = ChallengeCatalogue::new(backend);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.pcap");

        let written = catalogue.download_file(4, "dump.pcap", &dest).unwrap();

        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&dest).unwrap(), b"pcap-bytes");
    }
}

use crate::error::{ServiceError, ServiceResult};
use crate::models::{OperationResult, Testimonial, TestimonialInput};
use crate::store::collections::INTERVIEWS;
use crate::store::{Direction, DocumentStore, DocumentWrite};
use std::sync::Arc;
use tracing::{error, warn};

pub const DEFAULT_TESTIMONIAL_LIMIT: usize = 10;

pub struct TestimonialService {
    store: Arc<dyn DocumentStore>,
}

fn input_write(input: &TestimonialInput) -> DocumentWrite {
    DocumentWrite::new()
        .set("name", input.name.trim())
        .set("role", input.role.trim())
        .set("content", input.content.trim())
        .set("rating", input.rating)
        .set("image", input.image.trim())
}

impl TestimonialService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Newest first; a `limit` of 0 returns everything. Failures yield an
    /// empty list.
    pub async fn get_testimonials(&self, limit: usize) -> Vec<Testimonial> {
        match self.try_list(limit).await {
            Ok(items) => items,
            Err(e) => {
                error!("Error getting testimonials: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn try_list(&self, limit: usize) -> ServiceResult<Vec<Testimonial>> {
        let limit = (limit > 0).then_some(limit);
        let docs = self
            .store
            .query_ordered(INTERVIEWS, "createdAt", Direction::Desc, limit)
            .await?;

        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            match doc.decode::<Testimonial>() {
                Ok(item) => items.push(item),
                Err(e) => warn!(id = %doc.id, "Skipping malformed testimonial: {}", e),
            }
        }
        Ok(items)
    }

    pub async fn add_testimonial(&self, input: &TestimonialInput) -> OperationResult {
        match self.try_add(input).await {
            Ok(id) => OperationResult::created(id),
            Err(e) => {
                error!("Error adding testimonial: {}", e);
                e.into_result()
            }
        }
    }

    pub async fn try_add(&self, input: &TestimonialInput) -> ServiceResult<String> {
        input.validate().map_err(ServiceError::Validation)?;
        let write = input_write(input).server_timestamp("createdAt");
        Ok(self.store.add_document(INTERVIEWS, write).await?)
    }

    pub async fn update_testimonial(&self, id: &str, input: &TestimonialInput) -> OperationResult {
        match self.try_update(id, input).await {
            Ok(()) => OperationResult::ok(),
            Err(e) => {
                error!("Error updating testimonial: {}", e);
                e.into_result()
            }
        }
    }

    pub async fn try_update(&self, id: &str, input: &TestimonialInput) -> ServiceResult<()> {
        input.validate().map_err(ServiceError::Validation)?;
        if self.store.get_document(INTERVIEWS, id).await?.is_none() {
            return Err(ServiceError::NotFound("Testimonial".to_string()));
        }

        let write = input_write(input).server_timestamp("updatedAt");
        self.store.set_document(INTERVIEWS, id, write, true).await?;
        Ok(())
    }

    pub async fn delete_testimonial(&self, id: &str) -> OperationResult {
        match self.try_delete(id).await {
            Ok(()) => OperationResult::ok(),
            Err(e) => {
                error!("Error deleting testimonial: {}", e);
                e.into_result()
            }
        }
    }

    pub async fn try_delete(&self, id: &str) -> ServiceResult<()> {
        if self.store.delete_document(INTERVIEWS, id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Testimonial".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn input(name: &str) -> TestimonialInput {
        TestimonialInput {
            name: name.to_string(),
            role: "Founder".to_string(),
            content: "Saved us hours every week".to_string(),
            rating: 5,
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn test_lists_newest_first_with_limit() {
        let clock = Arc::new(ManualClock::new(1_000));
        let service = TestimonialService::new(Arc::new(MemoryStore::with_clock(clock.clone())));

        for name in ["first", "second", "third"] {
            assert!(service.add_testimonial(&input(name)).await.success);
            clock.advance_millis(1_000);
        }

        let items = service.get_testimonials(2).await;
        let names: Vec<_> = items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second"]);
        assert_eq!(service.get_testimonials(0).await.len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_testimonial_is_not_found() {
        let service = TestimonialService::new(Arc::new(MemoryStore::new()));
        let result = service.update_testimonial("nope", &input("x")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Testimonial not found"));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let service = TestimonialService::new(Arc::new(MemoryStore::new()));
        let id = service.add_testimonial(&input("Ada")).await.id.unwrap();

        let mut edited = input("Ada Lovelace");
        edited.rating = 4;
        assert!(service.update_testimonial(&id, &edited).await.success);

        let items = service.get_testimonials(10).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Ada Lovelace");
        assert_eq!(items[0].rating, 4);
        assert!(items[0].created_at.is_some());
        assert!(items[0].updated_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_rating_rejected() {
        let service = TestimonialService::new(Arc::new(MemoryStore::new()));
        let mut bad = input("Ada");
        bad.rating = 9;
        let result = service.add_testimonial(&bad).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Rating must be between 1 and 5"));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = TestimonialService::new(Arc::new(MemoryStore::new()));
        let id = service.add_testimonial(&input("Ada")).await.id.unwrap();

        assert!(service.delete_testimonial(&id).await.success);
        assert!(!service.delete_testimonial(&id).await.success);
        assert!(service.get_testimonials(10).await.is_empty());
    }
}

use std::collections::BTreeMap;

use sea_orm::{
    prelude::*, ActiveValue, DatabaseConnection, QueryOrder, TransactionTrait,
};
use serde::Deserialize;

use crate::{entity::feedback, error::FeedbackError};

pub const CSV_HEADER: [&str; 6] = [
    "id",
    "name",
    "email",
    "rating",
    "comments",
    "date_submitted",
];
pub const CSV_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Raw form fields as they arrive from the submission page.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub rating: String,
    pub comments: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSummary {
    pub records: Vec<feedback::Model>,
    pub total: usize,
    pub average_rating: f64,
    pub rating_histogram: BTreeMap<i64, usize>,
}

#[derive(Clone)]
pub struct FeedbackService {
    db: DatabaseConnection,
}
impl FeedbackService {
    pub fn new(db: DatabaseConnection) -> FeedbackService {
        FeedbackService { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn submit(&self, submission: Submission) -> Result<feedback::Model, FeedbackError> {
        let name = submission.name.trim();
        let email = submission.email.trim();
        let rating = submission.rating.trim();
        let comments = submission.comments.trim();

        if name.is_empty() || email.is_empty() || rating.is_empty() {
            return Err(FeedbackError::Validation(format!(
                "missing data: name={:?}, email={:?}, rating={:?}",
                name, email, rating
            )));
        }

        let rating = rating
            .parse::<i64>()
            .map_err(|e| FeedbackError::Validation(format!("invalid rating {:?}: {}", rating, e)))?;

        let entity = feedback::ActiveModel {
            name: ActiveValue::Set(name.to_owned()),
            email: ActiveValue::Set(email.to_owned()),
            rating: ActiveValue::Set(rating),
            comments: ActiveValue::Set(Some(comments.to_owned())),
            ..Default::default()
        };
        trace!("feedback entity: {:#?}", entity);

        // dropping an uncommitted transaction rolls it back
        let txn = self.db.begin().await?;
        let model = entity.insert(&txn).await?;
        txn.commit().await?;

        Ok(model)
    }

    pub async fn list_all(&self) -> Result<Vec<feedback::Model>, FeedbackError> {
        let records = feedback::Entity::find()
            .order_by_desc(feedback::Column::DateSubmitted)
            .order_by_desc(feedback::Column::Id)
            .all(&self.db)
            .await?;
        Ok(records)
    }

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, FeedbackError> {
        let records = self.list_all().await?;
        let ratings = records.iter().map(|f| f.rating).collect::<Vec<_>>();

        Ok(DashboardSummary {
            total: records.len(),
            average_rating: average_rating(&ratings),
            rating_histogram: rating_histogram(&ratings),
            records,
        })
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>, FeedbackError> {
        let records = self.list_all().await?;
        write_csv(&records)
    }
}

/// Mean rounded to two decimals with halves going to the even digit, 0 for no ratings.
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum = ratings.iter().map(|&r| r as f64).sum::<f64>();
    (sum / ratings.len() as f64 * 100.0).round_ties_even() / 100.0
}

/// Counts per rating 1..=5. Ratings outside that range are left out.
pub fn rating_histogram(ratings: &[i64]) -> BTreeMap<i64, usize> {
    let mut histogram = RATING_RANGE.map(|r| (r, 0)).collect::<BTreeMap<_, _>>();
    for rating in ratings {
        if let Some(count) = histogram.get_mut(rating) {
            *count += 1;
        }
    }
    histogram
}

pub fn write_csv(records: &[feedback::Model]) -> Result<Vec<u8>, FeedbackError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for f in records {
        writer.write_record([
            f.id.to_string(),
            f.name.clone(),
            f.email.clone(),
            f.rating.to_string(),
            f.comments.clone().unwrap_or_default(),
            f.date_submitted.format(CSV_DATE_FORMAT).to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| FeedbackError::Export(e.into_error().into()))
}

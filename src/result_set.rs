use crate::error::Error;
use crate::hydrator::Hydrator;
use crate::processor::{HydrateProcessor, Processor, RowStream};
use crate::Row;

/// A lazily processed stream of rows.
///
/// Processors attach in order with [`with_processor`](Self::with_processor)
/// and rows flow through the whole chain one at a time (buffering stages
/// excepted). Consume the set with [`fetch`](Self::fetch),
/// [`fetch_all`](Self::fetch_all), plain iteration, or
/// [`hydrate`](Self::hydrate) into a typed stream.
pub struct ResultSet<'a> {
    rows: RowStream<'a>,
}

impl<'a> ResultSet<'a> {
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'a,
    {
        ResultSet {
            rows: Box::new(rows.into_iter().map(Ok)),
        }
    }

    /// Wraps a source that can itself fail per row, e.g. a database cursor.
    pub fn from_fallible<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Result<Row, Error>>,
        I::IntoIter: 'a,
    {
        ResultSet {
            rows: Box::new(rows.into_iter()),
        }
    }

    /// Appends a transformation stage to the pipeline.
    pub fn with_processor<P>(self, processor: P) -> Self
    where
        P: Processor + 'a,
    {
        ResultSet {
            rows: processor.process(self.rows),
        }
    }

    /// Pulls the next row through the pipeline.
    pub fn fetch(&mut self) -> Result<Option<Row>, Error> {
        self.rows.next().transpose()
    }

    /// Drains the pipeline, stopping at the first failed row.
    pub fn fetch_all(self) -> Result<Vec<Row>, Error> {
        self.rows.collect()
    }

    /// Finishes the pipeline with a hydration stage.
    pub fn hydrate<T, H>(self, hydrator: H) -> Box<dyn Iterator<Item = Result<T, Error>> + 'a>
    where
        H: Hydrator<T> + 'a,
        T: 'a,
    {
        HydrateProcessor::new(hydrator).process(self.rows)
    }
}

impl<'a> Iterator for ResultSet<'a> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::processor::MergeProcessor;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> Vec<Row> {
        values
            .as_array()
            .expect("rows fixture")
            .iter()
            .map(|value| value.as_object().expect("row fixture").clone())
            .collect()
    }

    #[test]
    fn fetch_rows_one_by_one() {
        let mut result = ResultSet::new(rows(json!([{"id": 1}, {"id": 2}])));

        assert_eq!(result.fetch().unwrap(), Some(rows(json!([{"id": 1}])).remove(0)));
        assert_eq!(result.fetch().unwrap(), Some(rows(json!([{"id": 2}])).remove(0)));
        assert_eq!(result.fetch().unwrap(), None);
    }

    #[test]
    fn fetch_all_rows() {
        let input = rows(json!([{"id": 1}, {"id": 2}]));

        let result = ResultSet::new(input.clone()).fetch_all().unwrap();

        assert_eq!(result, input);
    }

    #[test]
    fn iterate_rows() {
        let input = rows(json!([{"id": 1}, {"id": 2}]));

        let collected: Vec<Row> = ResultSet::new(input.clone())
            .map(Result::unwrap)
            .collect();

        assert_eq!(collected, input);
    }

    #[test]
    fn fallible_source_propagates_errors() {
        let mut result = ResultSet::from_fallible([
            Ok(rows(json!([{"id": 1}])).remove(0)),
            Err(Error::EmptyResult),
        ]);

        assert!(result.fetch().unwrap().is_some());
        assert!(result.fetch().is_err());
    }

    #[test]
    fn processors_apply_in_attachment_order() {
        let node = Node::builder(["id"], ["id"])
            .join_collection("subs", Node::builder([("id", "sub_id")], ["sub_id"]))
            .build()
            .unwrap();

        let result = ResultSet::new(rows(json!([
            {"id": 1, "sub_id": 10},
            {"id": 1, "sub_id": 10},
            {"id": 1, "sub_id": 11},
        ])))
        .with_processor(&node)
        .with_processor(MergeProcessor::new("subs", ["id"]).unwrap())
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{"id": 1, "subs": [{"id": 10}, {"id": 11}]}]))
        );
    }
}

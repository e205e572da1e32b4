use crate::error::Error;
use crate::hydrator::Hydrator;
use crate::processor::RowStream;

/// Terminal stage that converts rows into values of a target type.
///
/// Unlike the row-to-row stages this one changes the item type of the
/// stream, so it does not implement [`Processor`](crate::Processor);
/// [`ResultSet::hydrate`](crate::ResultSet::hydrate) applies it as the
/// final step of a pipeline.
pub struct HydrateProcessor<H> {
    hydrator: H,
}

impl<H> HydrateProcessor<H> {
    pub fn new(hydrator: H) -> Self {
        HydrateProcessor { hydrator }
    }

    pub fn process<'a, T>(
        self,
        rows: RowStream<'a>,
    ) -> Box<dyn Iterator<Item = Result<T, Error>> + 'a>
    where
        H: Hydrator<T> + 'a,
        T: 'a,
    {
        Box::new(rows.map(move |row| row.and_then(|row| self.hydrator.hydrate(row))))
    }
}

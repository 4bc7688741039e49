use std::fmt;

use chrono::NaiveDateTime;

use crate::schema::DatasetSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
    Valid,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::Valid => "valid",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully resolved address in a dataset: a run base date, an ensemble
/// member, a forecast lead time in hours and the split the address belongs
/// to. Coordinates are plain values, derived from the schema and never
/// mutated.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub date: NaiveDateTime,
    pub member: u32,
    pub term: f64,
    pub split: Split,
}

/// Expand a schema into every addressable coordinate of one split.
///
/// Ordering is date-major, then member (declaration order), then term. This
/// is the canonical ordering of the Dataset Index: deterministic and stable
/// across calls, so a caller can reproducibly shuffle on top of it. A split
/// with no period configured yields an empty sequence, which is not an
/// error.
///
pub fn enumerate(schema: &DatasetSchema, split: Split) -> Vec<Coordinate> {
    let dates = match schema.periods.get(split) {
        Some(dates) => dates,
        None => return vec![],
    };

    let mut coordinates =
        Vec::with_capacity(dates.len() * schema.members.len() * schema.term.len());
    for i in 0..dates.len() {
        let date = dates.get(i);
        for &member in &schema.members {
            for j in 0..schema.term.len() {
                coordinates.push(Coordinate {
                    date,
                    member,
                    term: schema.term.get(j),
                    split,
                });
            }
        }
    }

    coordinates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::testing;
    use crate::time::{parse_datestamp, DateRange, TermRange};

    #[test]
    fn test_enumerate_ordering() -> Result<()> {
        let mut schema = testing::schema()?;
        schema.members = vec![0, 4, 1];
        schema.term = TermRange::inclusive(3.0, 4.0, 0.5)?;
        schema.periods.train = Some(DateRange::inclusive(
            parse_datestamp(2020061521)?,
            parse_datestamp(2020061621)?,
            24.0,
        )?);

        let coordinates = enumerate(&schema, Split::Train);
        assert_eq!(coordinates.len(), 2 * 3 * 3);

        // Date-major, then member in declaration order, then term.
        assert_eq!(coordinates[0].date, parse_datestamp(2020061521)?);
        assert_eq!(coordinates[0].member, 0);
        assert_eq!(coordinates[0].term, 3.0);
        assert_eq!(coordinates[1].term, 3.5);
        assert_eq!(coordinates[3].member, 4);
        assert_eq!(coordinates[6].member, 1);
        assert_eq!(coordinates[9].date, parse_datestamp(2020061621)?);
        assert_eq!(coordinates[9].member, 0);
        assert_eq!(coordinates[17].term, 4.0);

        for coordinate in &coordinates {
            assert_eq!(coordinate.split, Split::Train);
        }

        Ok(())
    }

    #[test]
    fn test_enumerate_deterministic() -> Result<()> {
        let schema = testing::schema()?;
        assert_eq!(
            enumerate(&schema, Split::Train),
            enumerate(&schema, Split::Train)
        );

        Ok(())
    }

    #[test]
    fn test_enumerate_missing_period_is_empty() -> Result<()> {
        let mut schema = testing::schema()?;
        schema.periods.valid = None;
        assert!(enumerate(&schema, Split::Valid).is_empty());

        Ok(())
    }

    #[test]
    fn test_coordinate_identity() -> Result<()> {
        let date = parse_datestamp(2020061521)?;
        let coordinate = Coordinate {
            date,
            member: 1,
            term: 3.25,
            split: Split::Test,
        };

        assert_eq!(coordinate, coordinate.clone());
        assert_ne!(
            coordinate,
            Coordinate {
                term: 3.5,
                ..coordinate
            }
        );
        assert_ne!(
            coordinate,
            Coordinate {
                split: Split::Valid,
                ..coordinate
            }
        );

        Ok(())
    }
}

use std::io::{ErrorKind, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::trace;

use crate::error::{Error, Result};
use crate::factory::Tabulator;
use crate::point::Point;
use crate::table::TabulatedFunction;

/// Upper bound on the points preallocated from an untrusted count.
const MAX_PREALLOCATED_POINTS: usize = 4096;

fn encoded_count(count: usize) -> Result<i32> {
    i32::try_from(count)
        .map_err(|_| Error::Format(format!("{count} points do not fit a 32-bit count")))
}

/// Writes a big-endian `i32` point count followed by `x, y` pairs of big-endian `f64`.
pub fn write_binary<T, W>(table: &T, mut writer: W) -> Result<()>
where
    T: TabulatedFunction + ?Sized,
    W: Write,
{
    let count = encoded_count(table.point_count())?;
    writer.write_i32::<BigEndian>(count)?;
    for point in table.points() {
        writer.write_f64::<BigEndian>(point.x())?;
        writer.write_f64::<BigEndian>(point.y())?;
    }
    writer.flush()?;
    trace!("Wrote {count} points in binary form");
    Ok(())
}

/// Reads a binary point list into a table built by the default factory.
pub fn read_binary<R: Read>(reader: R) -> Result<Box<dyn TabulatedFunction>> {
    read_binary_with(reader, &Tabulator::from_default())
}

pub fn read_binary_with<R: Read>(
    mut reader: R,
    tabulator: &Tabulator,
) -> Result<Box<dyn TabulatedFunction>> {
    let count = reader.read_i32::<BigEndian>().map_err(|error| {
        truncated(error, "stream ended before the point count")
    })?;
    let count = usize::try_from(count)
        .map_err(|_| Error::Format(format!("negative point count {count}")))?;

    let mut points = Vec::with_capacity(count.min(MAX_PREALLOCATED_POINTS));
    for index in 0..count {
        let ended = |error: std::io::Error| {
            truncated(error, &format!("stream ended at point {index} of {count}"))
        };
        let x = reader.read_f64::<BigEndian>().map_err(ended)?;
        let y = reader.read_f64::<BigEndian>().map_err(ended)?;
        points.push(Point::new(x, y));
    }
    trace!("Read {count} points in binary form");
    tabulator.from_points(&points)
}

fn truncated(error: std::io::Error, message: &str) -> Error {
    if error.kind() == ErrorKind::UnexpectedEof {
        Error::Format(message.to_owned())
    } else {
        Error::Io(error)
    }
}

/// Writes the point count and then `x y` pairs, separated by single spaces.
pub fn write_text<T, W>(table: &T, mut writer: W) -> Result<()>
where
    T: TabulatedFunction + ?Sized,
    W: Write,
{
    write!(writer, "{}", table.point_count())?;
    for point in table.points() {
        write!(writer, " {:?} {:?}", point.x(), point.y())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a text point list into a table built by the default factory.
pub fn read_text<R: Read>(reader: R) -> Result<Box<dyn TabulatedFunction>> {
    read_text_with(reader, &Tabulator::from_default())
}

pub fn read_text_with<R: Read>(
    mut reader: R,
    tabulator: &Tabulator,
) -> Result<Box<dyn TabulatedFunction>> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|error| {
        if error.kind() == ErrorKind::InvalidData {
            Error::Format("stream is not valid UTF-8".to_owned())
        } else {
            Error::Io(error)
        }
    })?;

    let mut tokens = text.split_whitespace();
    let count: usize = parse_token(tokens.next(), "point count")?;
    let mut points = Vec::with_capacity(count.min(MAX_PREALLOCATED_POINTS));
    for index in 0..count {
        let x = parse_token(tokens.next(), &format!("x of point {index}"))?;
        let y = parse_token(tokens.next(), &format!("y of point {index}"))?;
        points.push(Point::new(x, y));
    }
    trace!("Read {count} points in text form");
    tabulator.from_points(&points)
}

/// Numeric tokens are built from digits, `.`, `-`, `e` and `E` only.
fn parse_token<T: std::str::FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| Error::Format(format!("missing {what}")))?;
    let numeric = token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'));
    if !numeric {
        return Err(Error::Format(format!("malformed {what}: `{token}`")));
    }
    token
        .parse()
        .map_err(|_| Error::Format(format!("malformed {what}: `{token}`")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::table::{ArrayTabulatedFunction, Backend, LinkedListTabulatedFunction};

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(-2.5, 1e-7),
            Point::new(0.0, -0.0),
            Point::new(0.1, 3.0e12),
            Point::new(7.0, -42.125),
        ]
    }

    #[test]
    fn binary_layout() {
        let table = ArrayTabulatedFunction::from_points(&[
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
        ])
        .unwrap();
        let mut bytes = Vec::new();
        write_binary(&table, &mut bytes).unwrap();

        assert_eq!(bytes.len(), 4 + 2 * 16);
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..12], &1.0f64.to_be_bytes());
        assert_eq!(&bytes[12..20], &2.0f64.to_be_bytes());
        assert_eq!(&bytes[28..36], &4.0f64.to_be_bytes());
    }

    #[test]
    fn binary_round_trip() {
        let points = sample_points();
        let array = ArrayTabulatedFunction::from_points(&points).unwrap();
        let list = LinkedListTabulatedFunction::from_points(&points).unwrap();
        for backend in [Backend::Array, Backend::LinkedList] {
            let tabulator = Tabulator::for_backend(backend);

            let mut bytes = Vec::new();
            write_binary(&array, &mut bytes).unwrap();
            let decoded = read_binary_with(Cursor::new(&bytes), &tabulator).unwrap();
            assert_eq!(decoded.backend(), backend);
            assert!(array == *decoded.as_ref());

            let mut bytes = Vec::new();
            write_binary(&list, &mut bytes).unwrap();
            let decoded = read_binary_with(Cursor::new(&bytes), &tabulator).unwrap();
            assert!(list == *decoded.as_ref());
        }
    }

    #[test]
    fn binary_rejects_malformed_streams() {
        assert!(matches!(read_binary(Cursor::new(vec![0, 0])), Err(Error::Format(_))));
        assert!(matches!(
            read_binary(Cursor::new((-1i32).to_be_bytes().to_vec())),
            Err(Error::Format(_))
        ));

        let mut bytes = 2i32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&2.0f64.to_be_bytes());
        assert!(matches!(read_binary(Cursor::new(&bytes)), Err(Error::Format(_))));

        bytes.extend_from_slice(&2.0f64.to_be_bytes());
        assert!(read_binary(Cursor::new(&bytes)).is_ok());
    }

    #[test]
    fn binary_rejects_unordered_points() {
        let mut bytes = 2i32.to_be_bytes().to_vec();
        for value in [5.0f64, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        assert!(matches!(
            read_binary(Cursor::new(&bytes)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn text_round_trip() {
        let points = sample_points();
        let list = LinkedListTabulatedFunction::from_points(&points).unwrap();
        let mut text = Vec::new();
        write_text(&list, &mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("4 -2.5 "));

        for backend in [Backend::Array, Backend::LinkedList] {
            let tabulator = Tabulator::for_backend(backend);
            let decoded = read_text_with(text.as_bytes(), &tabulator).unwrap();
            assert!(list == *decoded.as_ref());
            for (expected, actual) in points.iter().zip(decoded.points()) {
                assert_eq!(expected.x().to_bits(), actual.x().to_bits());
            }
        }
    }

    #[test]
    fn text_accepts_any_whitespace() {
        let decoded = read_text("3\n0 0\t\t1 -1.5e0\r\n  2.0   4E0 trailing".as_bytes()).unwrap();
        assert_eq!(decoded.point_count(), 3);
        assert_eq!(decoded.point(1).unwrap(), Point::new(1.0, -1.5));
        assert_eq!(decoded.point(2).unwrap(), Point::new(2.0, 4.0));
    }

    #[test]
    fn text_rejects_malformed_streams() {
        assert!(matches!(read_text("".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(read_text("two 0 0 1 1".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(read_text("-2 0 0 1 1".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(read_text("2 0 0 1".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(read_text("2 0 0 1.2.3 1".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(read_text(&[0x32, 0x20, 0xff][..]), Err(Error::Format(_))));
        for token in ["NaN", "inf", "-infinity", "+1", "0x10"] {
            let text = format!("2 0 0 {token} 1");
            assert!(
                matches!(read_text(text.as_bytes()), Err(Error::Format(_))),
                "accepted `{token}`"
            );
        }
        assert!(matches!(read_text("+2 0 0 1 1".as_bytes()), Err(Error::Format(_))));
        assert!(matches!(
            read_text("2 1 0 1 0".as_bytes()),
            Err(Error::InvalidArgument(_))
        ));
    }
}

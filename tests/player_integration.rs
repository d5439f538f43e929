use crc32fast::Hasher as Crc32;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use time::macros::datetime;
use twse_daily::archive::{write_frame, ArchiveReader, ArchiveWriter, ARCHIVE_VERSION};
use twse_daily::record::{DailyDocument, FileHeader, OrderBookSnapshot, RecordFrame};
use twse_daily::BusinessDate;

fn doc(date: &str, bid_orders: u64) -> DailyDocument {
    let business_date = BusinessDate::parse(date).unwrap();
    let snap = |h: i64| OrderBookSnapshot {
        timestamp: business_date.midnight() + time::Duration::hours(h),
        bid_orders,
        bid_volume: 2,
        ask_orders: 3,
        ask_volume: 4,
        transaction_count: 5,
        trade_volume: 6,
        trade_value: 7,
    };
    DailyDocument {
        business_date,
        opening: snap(9),
        closing: snap(13),
        generated_at: datetime!(2019-02-15 14:00:00.123456789 +8),
    }
}

fn read_all(path: &std::path::Path) -> Vec<RecordFrame> {
    ArchiveReader::open(path)
        .unwrap()
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn append_then_play_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("daily.bin");

    let first = doc("20190215", 197_267);
    let second = doc("20190218", 201_004);
    ArchiveWriter::open_append(&path, "http://example.test/report?date=")
        .unwrap()
        .append(&first)
        .unwrap();
    // a second run reopens the same file
    ArchiveWriter::open_append(&path, "ignored")
        .unwrap()
        .append(&second)
        .unwrap();

    let frames = read_all(&path);
    assert_eq!(frames.len(), 3);
    match &frames[0] {
        RecordFrame::Header(h) => {
            assert_eq!(h.version, ARCHIVE_VERSION);
            assert_eq!(h.source, "http://example.test/report?date=");
        }
        other => panic!("unexpected frame {other:?}"),
    }
    assert_eq!(frames[1], RecordFrame::Document(first));
    assert_eq!(frames[2], RecordFrame::Document(second));
}

#[test]
fn frames_use_length_crc_payload_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.bin");
    let mut w = BufWriter::new(File::create(&path).unwrap());
    let frame = RecordFrame::Document(doc("20190215", 1));
    write_frame(&mut w, &frame).unwrap();
    w.flush().unwrap();
    drop(w);

    let mut r = BufReader::new(File::open(&path).unwrap());
    let mut b = [0u8; 4];
    r.read_exact(&mut b).unwrap();
    let len = u32::from_le_bytes(b) as usize;
    r.read_exact(&mut b).unwrap();
    let crc_file = u32::from_le_bytes(b);
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload).unwrap();
    let mut hasher = Crc32::new();
    hasher.update(&payload);
    assert_eq!(hasher.finalize(), crc_file);
    let decoded: RecordFrame = bincode::deserialize(&payload).unwrap();
    assert_eq!(decoded, frame);
    assert_eq!(r.read(&mut b).unwrap(), 0);
}

#[test]
fn crc_mismatch_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.bin");
    let mut f = BufWriter::new(File::create(&path).unwrap());
    let fr = RecordFrame::Header(FileHeader {
        version: ARCHIVE_VERSION,
        created_unix_ns: 0,
        source: "x".into(),
    });
    let payload = bincode::serialize(&fr).unwrap();
    let bad_crc = 0xDEADBEEFu32;
    let len = payload.len() as u32;
    f.write_all(&len.to_le_bytes()).unwrap();
    f.write_all(&bad_crc.to_le_bytes()).unwrap();
    f.write_all(&payload).unwrap();
    f.flush().unwrap();
    drop(f);

    let mut reader = ArchiveReader::open(&path).unwrap();
    let err = reader.next_frame().unwrap_err();
    assert!(err.to_string().contains("CRC mismatch at frame 0"), "{err}");
}

#[test]
fn truncated_payload_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    ArchiveWriter::open_append(&path, "src")
        .unwrap()
        .append(&doc("20190215", 1))
        .unwrap();
    let full = std::fs::metadata(&path).unwrap().len();

    // cut into the middle of the document payload
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(full - 3)
        .unwrap();
    let mut reader = ArchiveReader::open(&path).unwrap();
    assert!(matches!(reader.next_frame(), Ok(Some(RecordFrame::Header(_)))));
    assert!(reader.next_frame().is_err());
}

#[test]
fn partial_length_prefix_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefix.bin");
    ArchiveWriter::open_append(&path, "src").unwrap();
    let mut f = OpenOptions::new().append(true).open(&path).unwrap();
    f.write_all(&[1, 0]).unwrap();
    drop(f);

    let mut reader = ArchiveReader::open(&path).unwrap();
    assert!(matches!(reader.next_frame(), Ok(Some(RecordFrame::Header(_)))));
    let err = reader.next_frame().unwrap_err();
    assert!(err.to_string().contains("truncated frame 1"), "{err}");
}

#[test]
fn empty_file_has_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    File::create(&path).unwrap();
    let mut reader = ArchiveReader::open(&path).unwrap();
    assert!(reader.next_frame().unwrap().is_none());
    assert_eq!(reader.frames(), 0);
}

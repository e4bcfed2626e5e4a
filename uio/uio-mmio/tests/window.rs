use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use uio_memory_addresses::PageSize;
use uio_mmio::{
    AccessPolicy, ByteOrder, MapInfo, MappedRegion, MmioError, Width, host_page_size,
};

/// A read-write file large enough to back `pages` host pages.
fn backing_file(pages: u64) -> File {
    let file = tempfile::tempfile().unwrap();
    file.set_len(pages * host_page_size().as_u64()).unwrap();
    file
}

/// The unaligned example map: `addr=0x1000, size=0x150, offset=0x10`.
fn example_region(file: &File) -> MappedRegion {
    MappedRegion::map(file, 0, MapInfo::new(0x1000, 0x150, 0x10), PageSize::SIZE_4K).unwrap()
}

#[test]
fn example_map_geometry() {
    let file = backing_file(1);
    let region = example_region(&file);
    assert_eq!(region.alignment_skew(), 0x10);
    assert_eq!(region.mapped_length(), 0x1000);
    assert!(region.base().is_some());

    let regs = region.window(0, None).unwrap();
    assert_eq!(regs.len(), 0xFF0);
    assert_eq!(regs.offset(), 0x10);
}

#[test]
fn round_trip_every_width() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();

    regs.write_u8(0x00, 0xA5).unwrap();
    regs.write_u16(0x02, 0xBEEF).unwrap();
    regs.write_u32(0x04, 0xDEAD_BEEF).unwrap();
    regs.write_u64(0x08, 0x0123_4567_89AB_CDEF).unwrap();

    assert_eq!(regs.read_u8(0x00).unwrap(), 0xA5);
    assert_eq!(regs.read_u16(0x02).unwrap(), 0xBEEF);
    assert_eq!(regs.read_u32(0x04).unwrap(), 0xDEAD_BEEF);
    assert_eq!(regs.read_u64(0x08).unwrap(), 0x0123_4567_89AB_CDEF);

    for (width, offset, value) in [
        (Width::Byte, 0x20, 0x7F),
        (Width::Half, 0x22, 0x1234),
        (Width::Word, 0x24, 0x8000_0001),
        (Width::Quad, 0x28, u64::MAX),
    ] {
        regs.write_width(offset, width, value).unwrap();
        assert_eq!(regs.read_width(offset, width).unwrap(), value);
    }
}

#[test]
fn last_bytes_of_window_are_reachable() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();
    let end = regs.len();

    regs.write_u64(end - 8, 0x1122_3344_5566_7788).unwrap();
    assert_eq!(regs.read_u64(end - 8).unwrap(), 0x1122_3344_5566_7788);
    regs.write_u8(end - 1, 0x42).unwrap();
    assert_eq!(regs.read_u8(end - 1).unwrap(), 0x42);
}

#[test]
fn accesses_past_the_end_are_out_of_range() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, Some(0x10)).unwrap();

    for width in [Width::Byte, Width::Half, Width::Word, Width::Quad] {
        let offset = 0x10 - width.bytes() + 1;
        assert!(matches!(
            regs.read_width(offset, width),
            Err(MmioError::OutOfRange { length: 0x10, .. })
        ));
        assert!(matches!(
            regs.write_width(offset, width, 0),
            Err(MmioError::OutOfRange { length: 0x10, .. })
        ));
    }

    // The bytes just past the window are mapped, but still off limits.
    assert!(matches!(regs.read_u8(0x10), Err(MmioError::OutOfRange { .. })));
    assert!(matches!(
        regs.read_u32(usize::MAX - 1),
        Err(MmioError::OutOfRange { .. })
    ));
}

#[test]
fn oversized_values_are_rejected_without_writing() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();
    regs.write_u32(0, 0x5555_5555).unwrap();

    assert!(matches!(
        regs.write_width(0, Width::Byte, 0x100),
        Err(MmioError::ValueOutOfDomain {
            value: 0x100,
            width: 1
        })
    ));
    assert!(matches!(
        regs.write_width(0, Width::Word, 0x1_0000_0000),
        Err(MmioError::ValueOutOfDomain { width: 4, .. })
    ));
    assert_eq!(regs.read_u32(0).unwrap(), 0x5555_5555);
}

#[test]
fn unaligned_accesses_are_allowed_by_default() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();
    assert_eq!(regs.policy(), AccessPolicy::Unaligned);

    regs.write_u32(0x3, 0xCAFE_F00D).unwrap();
    assert_eq!(regs.read_u32(0x3).unwrap(), 0xCAFE_F00D);
    regs.write_u64(0x11, 0x0102_0304_0506_0708).unwrap();
    assert_eq!(regs.read_u64(0x11).unwrap(), 0x0102_0304_0506_0708);
}

#[test]
fn aligned_policy_rejects_misaligned_offsets() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region
        .window(0, None)
        .unwrap()
        .with_policy(AccessPolicy::Aligned);

    assert!(matches!(
        regs.read_u16(0x1),
        Err(MmioError::Misaligned { offset: 1, width: 2 })
    ));
    assert!(matches!(
        regs.write_u32(0x2, 0),
        Err(MmioError::Misaligned { offset: 2, width: 4 })
    ));
    regs.write_u8(0x1, 1).unwrap();
    regs.write_u32(0x4, 4).unwrap();
    assert_eq!(regs.read_u32(0x4).unwrap(), 4);
}

#[test]
fn aligned_policy_follows_window_offsets_not_addresses() {
    let file = backing_file(1);
    let region =
        MappedRegion::map(&file, 0, MapInfo::new(0x1002, 0x100, 0), PageSize::SIZE_4K).unwrap();
    assert_eq!(region.alignment_skew(), 2);
    let regs = region
        .window(0, None)
        .unwrap()
        .with_policy(AccessPolicy::Aligned);

    regs.write_u32(0, 0x0BAD_F00D).unwrap();
    assert_eq!(regs.read_u32(0).unwrap(), 0x0BAD_F00D);
    regs.write_u64(8, u64::MAX).unwrap();
    assert_eq!(regs.read_u64(8).unwrap(), u64::MAX);
    assert!(matches!(
        regs.read_u32(2),
        Err(MmioError::Misaligned { offset: 2, width: 4 })
    ));

    // Sub-windows check their own offsets.
    let inner = regs.window(2, None).unwrap();
    assert!(inner.read_u16(0).is_ok());
    assert!(matches!(
        inner.read_u16(1),
        Err(MmioError::Misaligned { offset: 1, width: 2 })
    ));
}

#[test]
fn big_endian_window_stores_msb_first() {
    let file = backing_file(1);
    let region = example_region(&file);
    let native = region.window(0, None).unwrap();
    let big = native.with_byte_order(ByteOrder::Big);

    big.write_u32(0, 0x1122_3344).unwrap();
    assert_eq!(big.read_u32(0).unwrap(), 0x1122_3344);
    assert_eq!(native.read_u8(0).unwrap(), 0x11);
    assert_eq!(native.read_u8(3).unwrap(), 0x44);

    let little = native.with_byte_order(ByteOrder::Little);
    little.write_u16(8, 0xAABB).unwrap();
    assert_eq!(native.read_u8(8).unwrap(), 0xBB);
    assert_eq!(native.read_u8(9).unwrap(), 0xAA);
}

#[test]
fn every_access_goes_to_memory() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();

    regs.write_u32(0x40, 0x1111_1111).unwrap();
    let mut buf = [0u8; 4];
    file.read_exact_at(&mut buf, 0x10 + 0x40).unwrap();
    assert_eq!(u32::from_ne_bytes(buf), 0x1111_1111);

    // A change behind the window's back must be visible on the next read.
    file.write_all_at(&0x2222_2222_u32.to_ne_bytes(), 0x10 + 0x40)
        .unwrap();
    assert_eq!(regs.read_u32(0x40).unwrap(), 0x2222_2222);
}

#[test]
fn sub_windows_are_bounded_by_their_parent() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0x100, Some(0x20)).unwrap();

    let inner = regs.window(0x10, None).unwrap();
    assert_eq!(inner.len(), 0x10);
    assert_eq!(inner.offset(), 0x10 + 0x100 + 0x10);
    inner.write_u32(0, 0xABCD_0123).unwrap();
    assert_eq!(regs.read_u32(0x10).unwrap(), 0xABCD_0123);

    assert!(matches!(
        regs.window(0x10, Some(0x11)),
        Err(MmioError::RegionRange { .. })
    ));
    assert!(matches!(
        regs.window(0x21, None),
        Err(MmioError::RegionRange { .. })
    ));
}

#[test]
fn windows_must_fit_the_mapping() {
    let file = backing_file(1);
    let region = example_region(&file);

    assert_eq!(region.window(0, Some(0xFF0)).unwrap().len(), 0xFF0);
    assert!(matches!(
        region.window(0, Some(0xFF1)),
        Err(MmioError::RegionRange {
            available: 0x1000,
            ..
        })
    ));
    assert!(matches!(
        region.window(0xFF1, None),
        Err(MmioError::RegionRange { .. })
    ));
    assert!(region.window(0xFF0, None).unwrap().is_empty());
}

#[test]
fn map_index_selects_file_page() {
    let page_size = host_page_size();
    let file = backing_file(3);
    file.write_all_at(&0x600D_CAFE_u32.to_ne_bytes(), 2 * page_size.as_u64())
        .unwrap();

    let region = MappedRegion::map(&file, 2, MapInfo::new(0, 0x100, 0), page_size).unwrap();
    assert_eq!(region.index(), 2);
    assert_eq!(
        u64::try_from(region.mapped_length()).unwrap(),
        page_size.as_u64()
    );
    assert_eq!(region.window(0, None).unwrap().read_u32(0).unwrap(), 0x600D_CAFE);
}

#[test]
fn invalid_map_requests_fail_to_map() {
    let file = backing_file(1);

    let err = MappedRegion::map(&file, 5, MapInfo::new(0, 0x100, 0), PageSize::SIZE_4K)
        .unwrap_err();
    assert!(matches!(err, MmioError::MapFailed { index: 5, ref source }
        if source.kind() == io::ErrorKind::InvalidInput));

    let err = MappedRegion::map(&file, 0, MapInfo::new(0, 0, 0), PageSize::SIZE_4K).unwrap_err();
    assert!(matches!(err, MmioError::MapFailed { index: 0, .. }));

    let err = MappedRegion::map(&file, 0, MapInfo::new(0, u64::MAX, 0), PageSize::SIZE_4K)
        .unwrap_err();
    assert!(matches!(err, MmioError::MapFailed { .. }));
}

#[test]
fn read_only_device_cannot_be_mapped_shared_writable() {
    let named = tempfile::NamedTempFile::new().unwrap();
    named.as_file().set_len(host_page_size().as_u64()).unwrap();
    let read_only = File::open(named.path()).unwrap();

    let err = MappedRegion::map(&read_only, 0, MapInfo::new(0, 0x100, 0), PageSize::SIZE_4K)
        .unwrap_err();
    assert!(matches!(err, MmioError::MapFailed { ref source, .. }
        if source.kind() == io::ErrorKind::PermissionDenied));
}

#[test]
fn unmap_is_idempotent_and_blocks_new_windows() {
    let file = backing_file(1);
    let mut region = example_region(&file);

    region.unmap().unwrap();
    region.unmap().unwrap();
    assert!(!region.is_mapped());
    assert!(region.base().is_none());
    assert!(matches!(
        region.window(0, None),
        Err(MmioError::Unmapped { index: 0 })
    ));
}

#[test]
fn mapping_outlives_the_file_descriptor() {
    let file = backing_file(1);
    let region = example_region(&file);
    drop(file);

    let regs = region.window(0, None).unwrap();
    regs.write_u16(0, 0x7777).unwrap();
    assert_eq!(regs.read_u16(0).unwrap(), 0x7777);
}

#[test]
fn windows_are_shared_across_threads() {
    let file = backing_file(1);
    let region = example_region(&file);
    let regs = region.window(0, None).unwrap();

    std::thread::scope(|s| {
        for lane in 0..4usize {
            s.spawn(move || {
                for i in 0..1000u32 {
                    regs.write_u32(lane * 4, i).unwrap();
                    assert_eq!(regs.read_u32(lane * 4).unwrap(), i);
                }
            });
        }
    });

    for lane in 0..4 {
        assert_eq!(regs.read_u32(lane * 4).unwrap(), 999);
    }
}

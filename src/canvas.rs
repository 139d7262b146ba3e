//! 방 캔버스 저장소와 스트로크 합성

use crate::error::StrokeError;
use crate::registry::{CanvasGuard, Registry, Room, Seat};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use tokio::task;
use uuid::Uuid;

/// 제출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 방의 첫 제출. 들어온 이미지가 그대로 캔버스가 됨
    Created,
    /// 기존 캔버스에 합성됨
    Merged,
}

/// 제출 이미지를 RGBA로 디코딩
///
/// 픽셀 수가 `max_pixels`를 넘으면 디코딩 전에 거부한다.
pub fn decode_stroke(bytes: &[u8], max_pixels: u64) -> Result<RgbaImage, StrokeError> {
    let decode_err = |e: image::ImageError| StrokeError::Decode(e.to_string());

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StrokeError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(decode_err)?;

    if width == 0 || height == 0 {
        return Err(StrokeError::Decode("empty image".to_string()));
    }
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(StrokeError::Decode(format!(
            "image is {}x{}, limit is {} pixels",
            width, height, max_pixels
        )));
    }

    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StrokeError::Decode(e.to_string()))?
        .decode()
        .map_err(decode_err)?;

    Ok(image.into_rgba8())
}

/// 픽셀 하나 합성
///
/// 각 픽셀의 알파를 가중치로 색을 더하고 알파도 더한다 (255에서 잘림).
/// 겹치는 스트로크는 서로 가리지 않고 진해진다.
pub fn blend(incoming: Rgba<u8>, existing: Rgba<u8>) -> Rgba<u8> {
    let [pr, pg, pb, pa] = incoming.0;
    let [er, eg, eb, ea] = existing.0;

    let in_weight = f32::from(pa) / 255.0;
    let ex_weight = f32::from(ea) / 255.0;
    let channel = |p: u8, e: u8| {
        (f32::from(p) * in_weight + f32::from(e) * ex_weight).clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(pr, er),
        channel(pg, eg),
        channel(pb, eb),
        (u16::from(pa) + u16::from(ea)).min(255) as u8,
    ])
}

/// 들어온 이미지를 캔버스에 합성
pub fn merge(incoming: &RgbaImage, canvas: &mut RgbaImage) -> Result<(), StrokeError> {
    if incoming.dimensions() != canvas.dimensions() {
        return Err(StrokeError::DimensionMismatch {
            width: incoming.width(),
            height: incoming.height(),
            canvas_width: canvas.width(),
            canvas_height: canvas.height(),
        });
    }

    for (out, &p) in canvas.pixels_mut().zip(incoming.pixels()) {
        *out = blend(p, *out);
    }
    Ok(())
}

/// 캔버스 파일 읽기. 파일이 없거나 비어 있으면 None
fn read_canvas(path: &Path) -> Result<Option<RgbaImage>, StrokeError> {
    let bytes = match fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match image::load_from_memory_with_format(&bytes, ImageFormat::Png)? {
        DynamicImage::ImageRgba8(canvas) => Ok(Some(canvas)),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("canvas has unexpected pixel format {:?}", other.color()),
        )
        .into()),
    }
}

const TEMP_SUFFIX: &str = ".tmp";

/// 캔버스 임시 파일 이름 접두어 (`.<room id>.png.`)
fn temp_prefix(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{}.", file_name)
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// 캔버스 파일 쓰기
///
/// 같은 디렉터리의 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽은 항상 완성된 파일만 본다.
fn write_canvas(path: &Path, canvas: &RgbaImage) -> Result<(), StrokeError> {
    let mut encoded = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

    let tmp = path.with_file_name(format!(
        "{}{}{}",
        temp_prefix(path),
        Uuid::new_v4(),
        TEMP_SUFFIX
    ));

    if let Err(e) = fs::write(&tmp, &encoded).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// 캔버스 읽기-합성-쓰기. 캔버스 락을 잡은 상태에서 blocking 스레드로 실행
fn composite(path: &Path, incoming: RgbaImage) -> Result<SubmitOutcome, StrokeError> {
    match read_canvas(path)? {
        None => {
            write_canvas(path, &incoming)?;
            Ok(SubmitOutcome::Created)
        }
        Some(mut canvas) => {
            merge(&incoming, &mut canvas)?;
            write_canvas(path, &canvas)?;
            Ok(SubmitOutcome::Merged)
        }
    }
}

/// 스트로크 제출
pub async fn submit_stroke(
    registry: &Registry,
    room_id: u32,
    uid: u32,
    bytes: Vec<u8>,
    max_pixels: u64,
) -> Result<SubmitOutcome, StrokeError> {
    let seat = registry
        .lookup(room_id, uid)
        .await
        .ok_or(StrokeError::NotFound)?;
    submit_to_seat(&seat, bytes, max_pixels).await
}

/// 조회가 끝난 좌석에 스트로크 제출
///
/// 레지스트리 락은 이미 풀린 상태이고, 여기서는 방별 캔버스 락만 잡는다.
pub async fn submit_to_seat(
    seat: &Seat,
    bytes: Vec<u8>,
    max_pixels: u64,
) -> Result<SubmitOutcome, StrokeError> {
    if seat.user().submitted() {
        return Err(StrokeError::AlreadySubmitted);
    }

    let incoming = task::spawn_blocking(move || decode_stroke(&bytes, max_pixels)).await??;

    let guard = seat.lock_canvas().await;
    commit(seat, guard, incoming).await
}

/// 캔버스 락 아래에서 재확인 후 합성하고 제출 표시
async fn commit(
    seat: &Seat,
    guard: CanvasGuard<'_>,
    incoming: RgbaImage,
) -> Result<SubmitOutcome, StrokeError> {
    // 락 대기 중 방이 삭제되었거나 같은 사용자의 다른 제출이 먼저 끝났을 수 있음
    if guard.is_retired() || seat.room().is_removed() {
        return Err(StrokeError::NotFound);
    }
    if seat.user().submitted() {
        return Err(StrokeError::AlreadySubmitted);
    }

    let path = guard.path().to_path_buf();
    let outcome = task::spawn_blocking(move || composite(&path, incoming)).await??;

    // 쓰기가 성공한 뒤에만 표시. 실패하면 같은 사용자가 다시 제출할 수 있다.
    seat.mark_submitted(&guard);
    drop(guard);

    tracing::info!(
        room_id = seat.room().id,
        uid = seat.user().uid,
        outcome = ?outcome,
        "Stroke merged"
    );

    Ok(outcome)
}

/// 삭제된 방의 캔버스 파일 제거
///
/// 이후 이 방에 대한 제출은 캔버스 락 아래에서 NotFound가 된다.
pub async fn discard(room: &Room) -> io::Result<()> {
    let mut guard = room.lock_canvas().await;
    guard.retire();

    match tokio::fs::remove_file(guard.path()).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    // 쓰기 도중 중단되어 남은 임시 파일
    let prefix = temp_prefix(guard.path());
    if let Some(dir) = guard.path().parent() {
        remove_temp_files(dir, |name| name.starts_with(&prefix)).await?;
    }
    Ok(())
}

/// 이전 실행에서 남은 임시 파일 정리 (시작 시 호출)
pub async fn remove_stale_temp_files(dir: &Path) -> io::Result<usize> {
    remove_temp_files(dir, |_| true).await
}

async fn remove_temp_files(dir: &Path, matches: impl Fn(&str) -> bool) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !is_temp_name(&name) || !matches(&name) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

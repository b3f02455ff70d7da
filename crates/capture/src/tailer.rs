//! 파일 tailer -- 소스 로그의 증분 읽기
//!
//! 소스 로그 파일 하나를 바이트 오프셋으로 추적하며, 매 tick마다
//! 마지막 오프셋 이후 추가된 완전한 라인만 읽습니다.
//! `tail -f`와 유사하지만 파일을 열어두지 않고 tick마다 다시 엽니다.
//!
//! # 로테이션 감지
//! - 파일 크기 축소 (truncation): 오프셋 0부터 다시 읽기
//! - inode 변경 (교체, Unix 전용): 오프셋 0부터 다시 읽기
//! - 파일 삭제: 한 번 경고하고 같은 경로가 다시 생기면 재개
//!
//! # 부분 라인
//! 줄바꿈으로 끝나지 않은 마지막 라인은 소비하지 않습니다.
//! 생산자가 라인을 마저 쓰면 다음 tick에서 온전한 라인으로 읽힙니다.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use logcap_core::metrics as m;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use crate::error::CaptureError;

/// 소스 파일 추적 상태
#[derive(Debug)]
pub struct FileTailer {
    /// 소스 파일 경로
    path: PathBuf,
    /// 마지막으로 완전히 읽은 위치 (바이트 오프셋)
    offset: u64,
    /// 마지막으로 확인한 inode (Unix 전용)
    inode: Option<u64>,
    /// 파일이 사라진 상태인지 (경고 중복 방지)
    missing: bool,
}

impl FileTailer {
    /// 파일 끝에서부터 tailing을 시작합니다.
    ///
    /// 기존 내용은 재생하지 않습니다. 파일이 없거나 일반 파일이 아니면
    /// [`CaptureError::SourceUnavailable`]을 반환합니다.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(CaptureError::SourceUnavailable { path }),
        };

        tracing::debug!(path = %path.display(), offset = metadata.len(), "tailing from end of file");
        Ok(Self {
            offset: metadata.len(),
            inode: inode_of(&metadata),
            missing: false,
            path,
        })
    }

    /// 지정한 오프셋에서 tailing을 시작합니다.
    ///
    /// 파일 존재 여부를 확인하지 않습니다. 첫 `read_new()`에서 확인됩니다.
    pub fn at_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            inode: None,
            missing: false,
        }
    }

    /// 후보 경로 중 처음으로 읽을 수 있는 일반 파일을 찾습니다.
    pub async fn resolve_source(candidates: &[PathBuf]) -> Option<PathBuf> {
        for candidate in candidates {
            let is_file = tokio::fs::metadata(candidate)
                .await
                .is_ok_and(|metadata| metadata.is_file());
            if is_file && tokio::fs::File::open(candidate).await.is_ok() {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// 마지막 오프셋 이후 추가된 완전한 라인을 읽습니다.
    ///
    /// 읽기 도중 I/O 에러가 발생하면 오프셋을 바꾸지 않고 에러를 반환하므로
    /// 다음 호출이 같은 위치에서 재시도합니다. 파일이 사라졌으면 빈 목록을 반환합니다.
    pub async fn read_new(&mut self) -> Result<Vec<String>, CaptureError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.missing {
                    tracing::warn!(path = %self.path.display(), "source log disappeared, waiting for it to reappear");
                    self.missing = true;
                }
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.read_error(e)),
        };

        if self.missing {
            tracing::info!(path = %self.path.display(), "source log reappeared");
            self.missing = false;
        }

        let mut start = self.offset;
        let size = metadata.len();

        let inode = inode_of(&metadata);
        if matches!((self.inode, inode), (Some(previous), Some(current)) if previous != current) {
            tracing::warn!(
                path = %self.path.display(),
                previous = ?self.inode,
                current = ?inode,
                "source log replaced, reading from start"
            );
            metrics::counter!(m::SOURCE_RESETS_TOTAL).increment(1);
            start = 0;
        }

        if size < start {
            tracing::warn!(
                path = %self.path.display(),
                size,
                offset = start,
                "source log truncated, reading from start"
            );
            metrics::counter!(m::SOURCE_RESETS_TOTAL).increment(1);
            start = 0;
        }

        let (lines, end) = if size == start {
            (Vec::new(), start)
        } else {
            self.read_from(start).await?
        };

        self.offset = end;
        self.inode = inode;

        if !lines.is_empty() {
            metrics::counter!(m::LINES_READ_TOTAL).increment(lines.len() as u64);
            tracing::trace!(path = %self.path.display(), count = lines.len(), offset = end, "read new lines");
        }
        Ok(lines)
    }

    /// `start`부터 파일 끝까지 완전한 라인을 읽고 마지막 라인 끝 위치를 반환합니다.
    async fn read_from(&self, start: u64) -> Result<(Vec<String>, u64), CaptureError> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| self.read_error(e))?;

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut position = start;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| self.read_error(e))?;
            if n == 0 || buf.last() != Some(&b'\n') {
                break;
            }
            position += n as u64;

            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok((lines, position))
    }

    fn read_error(&self, source: std::io::Error) -> CaptureError {
        metrics::counter!(m::READ_ERRORS_TOTAL).increment(1);
        CaptureError::Read {
            path: self.path.clone(),
            source,
        }
    }

    /// 소스 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 다음 읽기 시작 위치
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 소스 파일이 현재 사라진 상태인지
    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

#[cfg(unix)]
fn inode_of(metadata: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn inode_of(_metadata: &std::fs::Metadata) -> Option<u64> {
    None
}

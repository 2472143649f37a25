//! 청크 분할 -- 호출자가 넘긴 텍스트를 파서에 투입할 라인으로 나눕니다.

/// 청크를 `\n` 기준으로 나누고 빈 라인을 버립니다.
///
/// 순서는 원문 그대로 유지됩니다. `\r`은 제거하지 않으므로
/// CRLF 처리는 파서의 몫입니다.
pub fn split_lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk.split('\n').filter(|line| !line.is_empty())
}

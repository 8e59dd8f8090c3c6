use crate::address::PAGE_SIZE;

/// A flash device addressed in whole pages, with erase folded into programming.
pub trait PageFlash {
    type Error;

    /// Number of addressable pages.
    const PAGE_COUNT: u16;

    /// Reads page `page` into `buf`.
    fn read_page(&mut self, page: u16, buf: &mut [u8; PAGE_SIZE]) -> Result<(), Self::Error>;

    /// Replaces the contents of page `page` with `data`.
    fn write_page(&mut self, page: u16, data: &[u8; PAGE_SIZE]) -> Result<(), Self::Error>;

    /// Sets the whole array to the erased state of all 1s (FFh).
    fn erase_chip(&mut self) -> Result<(), Self::Error>;

    /// Reads page `page` back and compares it with `expected`.
    fn verify_page(&mut self, page: u16, expected: &[u8; PAGE_SIZE]) -> Result<bool, Self::Error> {
        let mut buf = [0u8; PAGE_SIZE];
        self.read_page(page, &mut buf)?;
        Ok(&buf == expected)
    }
}

/// Async counterpart of [`PageFlash`].
#[allow(async_fn_in_trait)]
pub trait AsyncPageFlash {
    type Error;

    const PAGE_COUNT: u16;

    async fn read_page(&mut self, page: u16, buf: &mut [u8; PAGE_SIZE])
        -> Result<(), Self::Error>;

    async fn write_page(&mut self, page: u16, data: &[u8; PAGE_SIZE]) -> Result<(), Self::Error>;

    async fn erase_chip(&mut self) -> Result<(), Self::Error>;

    async fn verify_page(
        &mut self,
        page: u16,
        expected: &[u8; PAGE_SIZE],
    ) -> Result<bool, Self::Error> {
        let mut buf = [0u8; PAGE_SIZE];
        self.read_page(page, &mut buf).await?;
        Ok(&buf == expected)
    }
}

//! `.lnk` creation through the `IShellLinkW` COM object.

use std::path::Path;

use windows::core::{Interface, HSTRING};
use windows::Win32::Foundation::TRUE;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, IPersistFile, CLSCTX_INPROC_SERVER,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::{IShellLinkW, ShellLink};

use crate::error::{Error, Result};

/// Owns COM initialization and one shell-link object for the current
/// thread. Both are acquired on the first write and released on drop.
#[derive(Default)]
pub(super) struct ShellLinkWriter {
    com_initialized: bool,
    link: Option<IShellLinkW>,
}

impl ShellLinkWriter {
    fn shell_link(&mut self) -> windows::core::Result<&IShellLinkW> {
        if !self.com_initialized {
            unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.ok()?;
            self.com_initialized = true;
        }

        let link = match self.link.take() {
            Some(link) => link,
            None => unsafe { CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER) }?,
        };
        Ok(self.link.insert(link))
    }

    pub(super) fn write(
        &mut self,
        path: &Path,
        target: &Path,
        arguments: Option<&str>,
        working_dir: &Path,
    ) -> Result<()> {
        let to_error = |e: windows::core::Error| Error::Shortcut {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        };

        let link = self.shell_link().map_err(to_error)?;
        unsafe {
            link.SetPath(&HSTRING::from(target)).map_err(to_error)?;
            link.SetArguments(&HSTRING::from(arguments.unwrap_or_default()))
                .map_err(to_error)?;
            link.SetWorkingDirectory(&HSTRING::from(working_dir))
                .map_err(to_error)?;

            let file: IPersistFile = link.cast().map_err(to_error)?;
            file.Save(&HSTRING::from(path), TRUE).map_err(to_error)?;
        }

        tracing::debug!("Wrote shell link {}", path.display());
        Ok(())
    }
}

impl Drop for ShellLinkWriter {
    fn drop(&mut self) {
        // The interface must be released before COM is torn down.
        self.link = None;
        if self.com_initialized {
            unsafe { CoUninitialize() };
        }
    }
}

// =============================================================================
// Named Universes (C3/C4/C9 support)
// =============================================================================
//
// Three fixed ticker lists, matching the blue-chip, medium-risk, and
// high-risk baskets the engine was configured with. These are compiled-in
// constants rather than config — they only ever change with a code release,
// same as the teacher's exchange symbol whitelist.
// =============================================================================

/// Custom additions appended to the blue-chip list, deduplicated against it.
const CUSTOM_TICKERS: &[&str] = &["RGTI", "QBTS", "QUBT"];

/// ~500-symbol blue-chip list.
const SNP500_TICKERS: &[&str] = &[
    "MMM", "AOS", "ABT", "ABBV", "ACN", "ADBE", "AMD", "AES", "AFL", "A", "APD", "ABNB", "AKAM",
    "ALB", "ARE", "ALGN", "ALLE", "LNT", "ALL", "GOOGL", "GOOG", "MO", "AMZN", "AMCR", "AEE",
    "AEP", "AXP", "AIG", "AMT", "AWK", "AMP", "AME", "AMGN", "APH", "ADI", "AON", "APA", "APO",
    "AAPL", "AMAT", "APTV", "ACGL", "ADM", "ANET", "AJG", "AIZ", "T", "ATO", "ADSK", "ADP", "AZO",
    "AVB", "AVY", "AXON", "BKR", "BALL", "BAC", "BAX", "BDX", "BBY", "TECH", "BIIB", "BLK", "BX",
    "BK", "BA", "BKNG", "BWA", "BSX", "BMY", "AVGO", "BR", "BRO", "BLDR", "BG", "BXP", "CHRW",
    "CDNS", "CZR", "CPT", "CPB", "COF", "CAH", "KMX", "CCL", "CARR", "CAT", "CBOE", "CBRE", "CDW",
    "CE", "COR", "CNC", "CNP", "CF", "CRL", "SCHW", "CHTR", "CVX", "CMG", "CB", "CHD", "CI",
    "CINF", "CTAS", "CSCO", "C", "CFG", "CLX", "CME", "CMS", "KO", "CTSH", "CL", "CMCSA", "CAG",
    "COP", "ED", "STZ", "CEG", "COO", "CPRT", "GLW", "CPAY", "CTVA", "CSGP", "COST", "CTRA",
    "CRWD", "CCI", "CSX", "CMI", "CVS", "DHR", "DRI", "DVA", "DAY", "DECK", "DE", "DELL", "DAL",
    "DVN", "DXCM", "FANG", "DLR", "DG", "DLTR", "D", "DPZ", "DOV", "DOW", "DHI", "DTE", "DUK",
    "DD", "EMN", "ETN", "EBAY", "ECL", "EIX", "EW", "EA", "ELV", "EMR", "ENPH", "EOG", "EPAM",
    "EQT", "EFX", "EQIX", "EQR", "ERIE", "ESS", "EL", "EG", "EVRG", "ES", "EXC", "EXPE", "EXPD",
    "EXR", "XOM", "FFIV", "FDS", "FICO", "FAST", "FRT", "FDX", "FIS", "FITB", "FSLR", "FE", "FI",
    "FMC", "F", "FTNT", "FTV", "FOXA", "FOX", "BEN", "FCX", "GRMN", "IT", "GE", "GEHC", "GEV",
    "GEN", "GNRC", "GD", "GIS", "GM", "GPC", "GILD", "GPN", "GL", "GDDY", "GS", "HAL", "HIG",
    "HAS", "HCA", "DOC", "HSIC", "HSY", "HPE", "HLT", "HOLX", "HD", "HON", "HRL", "HST", "HWM",
    "HPQ", "HUBB", "HUM", "HBAN", "HII", "IBM", "IEX", "IDXX", "ITW", "INCY", "IR", "PODD",
    "INTC", "ICE", "IFF", "IP", "IPG", "INTU", "ISRG", "IVZ", "INVH", "IQV", "IRM", "JBHT", "JBL",
    "JKHY", "J", "JNJ", "JCI", "JPM", "K", "KVUE", "KDP", "KEY", "KEYS", "KMB", "KIM", "KMI",
    "KKR", "KLAC", "KHC", "KR", "LHX", "LH", "LRCX", "LW", "LVS", "LDOS", "LEN", "LII", "LLY",
    "LIN", "LYV", "LKQ", "LMT", "L", "LOW", "LULU", "LYB", "MTB", "MPC", "MKTX", "MAR", "MMC",
    "MLM", "MAS", "MA", "MTCH", "MKC", "MCD", "MCK", "MDT", "MRK", "META", "MET", "MTD", "MGM",
    "MCHP", "MU", "MSFT", "MAA", "MRNA", "MHK", "MOH", "TAP", "MDLZ", "MPWR", "MNST", "MCO",
    "MS", "MOS", "MSI", "MSCI", "NDAQ", "NTAP", "NFLX", "NEM", "NWSA", "NWS", "NEE", "NKE", "NI",
    "NDSN", "NSC", "NTRS", "NOC", "NCLH", "NRG", "NUE", "NVDA", "NVR", "NXPI", "ORLY", "OXY",
    "ODFL", "OMC", "ON", "OKE", "ORCL", "OTIS", "PCAR", "PKG", "PLTR", "PANW", "PSKY", "PH",
    "PAYX", "PAYC", "PYPL", "PNR", "PEP", "PFE", "PCG", "PM", "PSX", "PNW", "PNC", "POOL", "PPG",
    "PPL", "PFG", "PG", "PGR", "PLD", "PRU", "PEG", "PTC", "PSA", "PHM", "PWR", "QCOM", "DGX",
    "RL", "RJF", "RTX", "O", "REG", "REGN", "RF", "RSG", "RMD", "RVTY", "ROK", "ROL", "ROP",
    "ROST", "RCL", "SPGI", "CRM", "SBAC", "SLB", "STX", "SRE", "NOW", "SHW", "SPG", "SWKS", "SJM",
    "SW", "SNA", "SOLV", "SO", "LUV", "SWK", "SBUX", "STT", "STLD", "STE", "SYK", "SMCI", "SYF",
    "SNPS", "SYY", "TMUS", "TROW", "TTWO", "TPR", "TRGP", "TGT", "TEL", "TDY", "TFX", "TER",
    "TSLA", "TXN", "TPL", "TXT", "TMO", "TJX", "TSCO", "TT", "TDG", "TRV", "TRMB", "TFC", "TYL",
    "TSN", "USB", "UBER", "UDR", "ULTA", "UNP", "UAL", "UPS", "URI", "UNH", "UHS", "VLO", "VTR",
    "VLTO", "VRSN", "VRSK", "VZ", "VRTX", "VTRS", "VICI", "V", "VST", "VMC", "WRB", "GWW", "WAB",
    "WMT", "DIS", "WBD", "WM", "WAT", "WEC", "WFC", "WELL", "WST", "WDC", "WY", "WMB", "WTW",
    "WDAY", "WYNN", "XEL", "XYL", "YUM", "ZBRA", "ZBH", "ZTS",
];

/// Medium-risk universe: an explicit small list, distinct from the custom
/// blue-chip additions above despite sharing the same three symbols today.
const MEDIUM_TICKERS: &[&str] = &["RGTI", "QBTS", "QUBT"];

/// Large curated high-risk universe.
const HIGH_TICKERS: &[&str] = &[
    "AA", "AAL", "AAMI", "AAOI", "AAP", "AAT", "ABCL", "ABEO", "ABEV", "ABG", "ABOS", "ABR",
    "ABSI", "ACAD", "ACDC", "ACHC", "ACHR", "ACI", "ACLS", "ACLX", "ACMR", "ACRS", "AD", "ADC",
    "ADCT", "ADEA", "ADPT", "ADV", "AEG", "AEHR", "AEO", "AEVA", "AG", "AGD", "AGIO", "AGNC",
    "AI", "AIFU", "AL", "ALE", "ALEX", "ALGT", "ALHC", "ALIT", "ALLO", "ALNY", "ALT", "ALTG",
    "ALXO", "AM", "AMBA", "AMBQ", "AMH", "AMR", "AMRZ", "AMSC", "ANAB", "ANGI", "AOD", "AORT",
    "AOSL", "APDN", "APEI", "APGE", "APLD", "APLS", "APP", "AR", "ARAY", "ARBK", "ARCB", "ARCC",
    "ARCT", "ARDT", "ARES", "ARMN", "AROC", "ARQT", "ARRY", "ARX", "AS", "ASA", "ASIX", "ASMB",
    "ASPI", "ASTS", "ASX", "ASYS", "ATLC", "ATUS", "AU", "AUGO", "AUR", "AUTL", "AVAL", "AVBH",
    "AVBP", "AVD", "AVO", "AVXL", "AXL", "AXR", "AXS", "AXTA", "AXTI", "B", "BABA", "BB", "BBAI",
    "BBD", "BBW", "BCH", "BCPC", "BDN", "BE", "BEAM", "BF-B", "BFLY", "BGS", "BHFAP", "BINI",
    "BIRD", "BITF", "BJ", "BKH", "BKKT", "BKSY", "BLD", "BLNK", "BMNR", "BNBX", "BNGO", "BOLD",
    "BOW", "BPYPP", "BRK-B", "BRW", "BRX", "BSBR", "BSLK", "BSVN", "BTBT", "BTCM", "BTDR", "BTG",
    "BULL", "BURL", "BVN", "BW", "BYM", "BYND", "BYRN", "CABA", "CACC", "CAI", "CAKE", "CAL",
    "CALM", "CAMT", "CAPR", "CAR", "CARE", "CARS", "CASY", "CAVA", "CBL", "CBRL", "CBT", "CCEC",
    "CCRD", "CCU", "CDE", "CECO", "CEE", "CELH", "CENX", "CEVA", "CFFI", "CFLT", "CGEM", "CGON",
    "CHCT", "CHEK", "CHRD", "CHRS", "CIEN", "CIFR", "CINT", "CIO", "CISS", "CLB", "CLF", "CLMT",
    "CLNE", "CLS", "CLSK", "CLW", "CMA", "CMC", "CMPS", "CMTG", "CMTL", "CNF", "CNH", "CNK",
    "CNQ", "CNR", "CNX", "COHU", "COIN", "COKE", "CORZ", "CPNG", "CQP", "CRAI", "CRBU", "CRC",
    "CRCL", "CRD-A", "CRDF", "CRDO", "CRH", "CRK", "CRMD", "CRNC", "CRNT", "CRNX", "CRS", "CRSP",
    "CRSR", "CRTO", "CRWV", "CSGS", "CSR", "CTLP", "CTMX", "CTOS", "CTRN", "CUBE", "CVE", "CVLT",
    "CVNA", "CW", "CWEN-A", "CX", "CXM", "CYBR", "CYD", "CYH", "DAO", "DASH", "DAVE", "DBI",
    "DCO", "DDD", "DDL", "DDOG", "DFDV", "DGICA", "DGII", "DIN", "DINO", "DJT", "DK", "DKNG",
    "DLTH", "DLX", "DNA", "DNLI", "DNN", "DNUT", "DQ", "DRD", "DSX", "DTM", "DUOL", "DWSN", "DX",
    "DXPE", "DXYZ", "DYN", "EAF", "EAT", "EB", "EBS", "EC", "EDIT", "EEFT", "EGO", "EGP", "EHAB",
    "ELF", "ELP", "ELS", "ENLT", "ENOV", "ENR", "ENS", "ENVA", "ENVX", "EOLS", "EOSE", "EPD",
    "EQNR", "EQX", "ERIC", "ERII", "ERO", "ESI", "ESRT", "ESTA", "ET", "ETR", "ETSY", "ETV",
    "EVEX", "EVGO", "EVH", "EVTL", "EXE", "EXK", "EXP", "EXTR", "EYE", "EZPW", "FCNCA", "FDMT",
    "FEAM", "FERG", "FFAI", "FGNX", "FIG", "FINV", "FIP", "FIX", "FLEX", "FLNC", "FLUT", "FLWS",
    "FLXS", "FLY", "FMCC", "FNB", "FNF", "FNKO", "FNMA", "FNV", "FOUR", "FPH", "FPI", "FRO",
    "FRPT", "FSM", "FTI", "FTK", "FTRE", "FUBO", "FUN", "FUNC", "FUTU", "FVRR", "FWONA", "FWRD",
    "FYBR", "GBX", "GCL", "GCMG", "GCO", "GCTK", "GCTS", "GEL", "GERN", "GETY", "GEVO", "GFI",
    "GGB", "GHC", "GHM", "GIII", "GKOS", "GLDD", "GLPI", "GMAB", "GME", "GO", "GOSS", "GPRE",
    "GRAB", "GRAL", "GRC", "GRI", "GRP-UN", "GRPN", "GSAT", "GSBD", "GSIT", "GTN", "GTN-A", "GTX",
    "HAE", "HAIN", "HALO", "HBM", "HBNC", "HCTI", "HCWB", "HEI-A", "HESM", "HIMS", "HL", "HLF",
    "HLN", "HMC", "HMN", "HMY", "HNGE", "HONE", "HOOD", "HOUS", "HQY", "HRTG", "HRTX", "HRZN",
    "HTFL", "HTLD", "HTZ", "HUBG", "HUMA", "HUN", "HUT", "HWBK", "HWKN", "HYPD", "HZO", "IAG",
    "IAS", "IBKR", "IBRX", "IBTA", "IDA", "IDCC", "IDT", "IFRX", "IGA", "IGD", "IGR", "ILMN",
    "IMAX", "IMCR", "IMMR", "IMNM", "IMO", "INDI", "INDP", "INFY", "INGM", "INMD", "INOD", "INSG",
    "INSM", "INTR", "INVX", "IONQ", "IOT", "IOVA", "IPGP", "IPI", "IQ", "IRBT", "IREN", "IRON",
    "ISSC", "ITIC", "ITUB", "IX", "JACK", "JAKK", "JBGS", "JBLU", "JBS", "JD", "JEF", "JELD",
    "JHS", "JHX", "JLL", "JMIA", "JOBY", "KALU", "KALV", "KB", "KEP", "KGC", "KGS", "KLXE",
    "KMDA", "KNDI", "KNF", "KNX", "KOF", "KORE", "KRO", "KSPI", "KSS", "KULR", "KURA", "KYTX",
    "LAC", "LAMR", "LAUR", "LAW", "LAZR", "LB", "LBRDA", "LBRDK", "LBTYA", "LC", "LCFY", "LCID",
    "LDI", "LEGN", "LENZ", "LEU", "LGO", "LILA", "LILAK", "LINC", "LINE", "LITE", "LKNCY",
    "LLYVA", "LLYVK", "LMND", "LNG", "LOVE", "LQDA", "LQDT", "LSPD", "LSTR", "LTM", "LUMN",
    "LUNR", "LUXE", "LX", "LYFT", "LYG", "LZ", "MANH", "MARA", "MAT", "MATV", "MATX", "MBLY",
    "MBOT", "MCHX", "MDGL", "MDU", "MEC", "MELI", "MEOH", "MESO", "MFA", "MFG", "MFH", "MGNX",
    "MGTX", "MGX", "MH", "MIDD", "MIN", "MIR", "MIRM", "MKL", "MKSI", "MNMD", "MNRO", "MOD",
    "MP", "MPLX", "MPW", "MRSN", "MRVI", "MRVL", "MRX", "MSB", "MSC", "MSGS", "MSTR", "MT",
    "MTDR", "MTSI", "MTW", "MUX", "MVIS", "MXCT", "MYFW", "MYGN", "NBIS", "NBR", "NBTX", "NBY",
    "NCNA", "NCV", "NCZ", "NDLS", "NEOG", "NET", "NEU", "NFBK", "NFE", "NFG", "NFJ", "NGD", "NGS",
    "NGVC", "NIO", "NJR", "NLY", "NMAX", "NMCO", "NMG", "NMR", "NMZ", "NNE", "NNI", "NNN", "NOG",
    "NOK", "NOTE", "NOV", "NPK", "NPWR", "NRDY", "NRGV", "NRIM", "NRIX", "NTES", "NTLA", "NTRA",
    "NTST", "NU", "NUKK", "NUTX", "NUVB", "NVAX", "NVMI", "NVO", "NVRI", "NVTS", "NWBI", "NWE",
    "NXE", "NXST", "NXT", "NXTC", "NYT", "OCGN", "OCUL", "OGE", "OGN", "OGS", "OHI", "OII",
    "OKLO", "OLLI", "OLN", "OMER", "OMI", "ONC", "ONDS", "ONIT", "ONON", "OPAD", "OPEN", "OPFI",
    "OPY", "ORA", "ORLA", "ORN", "OS", "OSCR", "OSK", "OVV", "OWL", "OXM", "PAA", "PACB", "PACK",
    "PAR", "PATH", "PAY", "PBA", "PBF", "PBM", "PBR", "PBR-A", "PBYI", "PCB", "PCOR", "PCRX",
    "PCT", "PD", "PDT", "PDYN", "PEN", "PENN", "PFGC", "PFIS", "PFSI", "PHAT", "PHVS", "PHYS",
    "PI", "PII", "PINS", "PK", "PKOH", "PKST", "PL", "PLAY", "PLCE", "PLOW", "PLUG", "PLYM",
    "PMVP", "PNFP", "PONY", "POR", "POWL", "PPC", "PR", "PRAA", "PRAX", "PRCT", "PRG", "PRMB",
    "PROK", "PRSU", "PRTA", "PRTS", "PSFE", "PSLV", "PSTG", "PSTL", "PTLO", "PTON", "PX", "PYXS",
    "QCLS", "QS", "QURE", "RAMP", "RARE", "RBLX", "RBOT", "RBRK", "RC", "RCAT", "RCEL", "RCUS",
    "RDDT", "RDNT", "RDW", "REAL", "REPL", "REXR", "RGC", "RGLD", "RGNX", "RH", "RHLD", "RIG",
    "RILY", "RIOT", "RIVN", "RKLB", "RKT", "RM", "RNA", "RNGR", "ROKU", "RPM", "RPRX", "RPTX",
    "RRC", "RS", "RUM", "RUN", "RVLV", "RVMD", "RWAY", "RXO", "RXRX", "RXT", "RY", "RYAM", "SAIA",
    "SAIL", "SANA", "SANM", "SAR", "SATS", "SBET", "SBH", "SBSW", "SCCO", "SCL", "SCS", "SD",
    "SEDG", "SEI", "SEM", "SERV", "SES", "SFBS", "SFD", "SFM", "SG", "SGBX", "SGU", "SHBI", "SHG",
    "SHOP", "SIDU", "SIG", "SILA", "SIRI", "SKE", "SLDB", "SLNH", "SLS", "SMA", "SMBK", "SMG",
    "SMLR", "SMMT", "SMR", "SMRT", "SMWB", "SNAP", "SNBR", "SNDK", "SNDR", "SNDX", "SNOW", "SNV",
    "SOC", "SOFI", "SONN", "SOUN", "SPCE", "SPE", "SPHR", "SPOT", "SPRO", "SPRU", "SPRY", "SPXX",
    "SR", "SRDX", "SRFM", "SRPT", "SRRK", "SSD", "SSTK", "ST", "STC", "STGW", "STLA", "STOK",
    "STRL", "STTK", "STVN", "SUI", "SUN", "SVC", "SVCO", "SWX", "SXT", "SYM", "SYNA", "SYRE",
    "SZRRF", "TAC", "TALO", "TAOX", "TARS", "TBHC", "TCBX", "TD", "TDOC", "TDS", "TDW", "TE",
    "TEAD", "TECK", "TEI", "TEM", "TEO", "TEVA", "TGE", "TGL", "TGS", "TGTX", "THC", "THG", "TIC",
    "TIGO", "TIGR", "TILE", "TIMB", "TKO", "TLK", "TLN", "TLNE", "TLRY", "TLX", "TMC", "TMDX",
    "TMHC", "TNGX", "TNXP", "TRIN", "TRIP", "TRP", "TRU", "TRUP", "TS", "TSAT", "TSHA", "TSM",
    "TSSI", "TTD", "TTGT", "TTI", "TV", "TWLO", "TWST", "TXNM", "UAN", "UCTT", "UEC", "UFPI",
    "UGI", "UI", "ULH", "UMC", "UNM", "UOKA", "UPBD", "UPST", "UPWK", "UPXI", "URBN", "URGN",
    "USAR", "USFD", "USLM", "USPH", "UTHR", "UTI", "UTZ", "UUUU", "UWMC", "VALE", "VEEV", "VEL",
    "VERA", "VFC", "VG", "VICR", "VIK", "VIR", "VIRT", "VIST", "VITL", "VKTX", "VNO", "VNOM",
    "VOR", "VOYG", "VRNS", "VRNT", "VRT", "VRTS", "VSAT", "VSCO", "VSTM", "VTEX", "VTLE", "VTOL",
    "VTS", "VUZI", "VYGR", "W", "WAL", "WBX", "WCC", "WCN", "WDH", "WEA", "WES", "WF", "WHR",
    "WIT", "WIW", "WKHS", "WLDS", "WLK", "WMG", "WOLF", "WPC", "WPP", "WPRT", "WRD", "WSBF", "WSC",
    "WSM", "WSR", "WT", "WTBA", "WTI", "WTRG", "WULF", "XHR", "XNET", "XPO", "XPOF", "XRX", "XYF",
    "XYZ", "YEXT", "YOU", "ZBIO", "ZEPP", "ZETA", "ZG", "ZIM", "ZION", "ZNB", "ZS", "ZYXI",
];

/// Blue-chip universe: the ~500-symbol list plus custom additions, deduped
/// and order-preserved (first occurrence wins).
pub fn low_universe() -> Vec<String> {
    dedup_preserve_order(SNP500_TICKERS.iter().chain(CUSTOM_TICKERS.iter()))
}

/// First 100 of the blue-chip universe (before custom additions are mixed
/// in), used as the low-bucket slice in the live multi-bucket strategy.
pub fn low_universe_bucket_slice() -> Vec<String> {
    low_universe().into_iter().take(100).collect()
}

pub fn medium_universe() -> Vec<String> {
    MEDIUM_TICKERS.iter().map(|s| s.to_string()).collect()
}

pub fn high_universe() -> Vec<String> {
    HIGH_TICKERS.iter().map(|s| s.to_string()).collect()
}

/// Union of all three named universes, deduplicated, preserving first-seen
/// order. This is what C3 downloads in a single pass.
pub fn download_universe() -> Vec<String> {
    dedup_preserve_order(
        low_universe()
            .iter()
            .chain(medium_universe().iter())
            .chain(high_universe().iter()),
    )
}

/// Resolve a universe by config-file name (`"low"`, `"medium"`, `"high"`).
pub fn by_name(name: &str) -> Option<Vec<String>> {
    match name {
        "low" => Some(low_universe()),
        "medium" => Some(medium_universe()),
        "high" => Some(high_universe()),
        _ => None,
    }
}

fn dedup_preserve_order<'a>(tickers: impl Iterator<Item = &'a String>) -> Vec<String>
where
{
    dedup_preserve_order_str(tickers.map(|s| s.as_str()))
}

fn dedup_preserve_order_str<'a>(tickers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for t in tickers {
        if seen.insert(t) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_universe_includes_custom_tickers() {
        let u = low_universe();
        assert!(u.contains(&"RGTI".to_string()));
        assert!(u.contains(&"AAPL".to_string()));
    }

    #[test]
    fn low_universe_has_no_duplicates() {
        let u = low_universe();
        let unique: std::collections::HashSet<_> = u.iter().collect();
        assert_eq!(u.len(), unique.len());
    }

    #[test]
    fn low_universe_bucket_slice_is_first_100() {
        let full = low_universe();
        let slice = low_universe_bucket_slice();
        assert_eq!(slice.len(), 100);
        assert_eq!(slice, full[..100].to_vec());
    }

    #[test]
    fn medium_universe_matches_custom_list() {
        assert_eq!(medium_universe(), vec!["RGTI", "QBTS", "QUBT"]);
    }

    #[test]
    fn high_universe_is_large_and_deduplicated() {
        let u = high_universe();
        assert!(u.len() > 900);
        let unique: std::collections::HashSet<_> = u.iter().collect();
        assert_eq!(u.len(), unique.len());
    }

    #[test]
    fn download_universe_is_union_of_all_three_deduplicated() {
        let u = download_universe();
        assert!(u.contains(&"AAPL".to_string()));
        assert!(u.contains(&"QUBT".to_string()));
        let unique: std::collections::HashSet<_> = u.iter().collect();
        assert_eq!(u.len(), unique.len());
    }

    #[test]
    fn by_name_resolves_known_names_and_rejects_unknown() {
        assert!(by_name("low").is_some());
        assert!(by_name("medium").is_some());
        assert!(by_name("high").is_some());
        assert!(by_name("nonexistent").is_none());
    }
}

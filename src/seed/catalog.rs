//! The department and position catalog loaded into an empty database.
//!
//! Headcounts are the pre-layoff totals. Planned cuts start at zero and are
//! filled in later by an admin or by `update-cuts`.

pub struct SeedPosition {
    pub title: &'static str,
    pub cor_code: &'static str,
    pub total: i64,
}

pub struct SeedDepartment {
    pub name: &'static str,
    pub positions: &'static [SeedPosition],
}

const fn pos(title: &'static str, cor_code: &'static str, total: i64) -> SeedPosition {
    SeedPosition { title, cor_code, total }
}

pub const CATALOG: &[SeedDepartment] = &[
    SeedDepartment {
        name: "Boost",
        positions: &[
            pos("Machine Learning Engineer", "251204", 1),
        ],
    },
    SeedDepartment {
        name: "CC (Caesars Slots)",
        positions: &[
            pos("2D Animator", "251101", 1),
            pos("2D Artist", "251101, 251201", 7),
            pos("Animator", "251101", 3),
            pos("Art Group Manager", "122314", 1),
            pos("Art Team Leader", "122314, 251206", 2),
            pos("C# Developer", "251202, 251204, 351201", 17),
            pos("C# Technical Lead", "251202, 251204", 5),
            pos("Copywriter", "351202", 1),
            pos("Flash Integrator", "251101, 351202", 7),
            pos("Java Developer", "251202, 251204", 11),
            pos("Java Technical Lead", "121904, 251202, 251204", 5),
            pos("JavaScript Developer", "251202, 251204", 2),
            pos("JavaScript Technical Lead", "251202", 1),
            pos("Lead Animator", "251201", 1),
            pos("Manual QA Engineer", "251201, 351202", 17),
            pos("Monetization Operations Specialist", "251201", 2),
            pos("Product Owner (Tech)", "121904", 1),
            pos("Product Senior Expert", "121904", 1),
            pos("Program Lead", "251206", 1),
            pos("QA Automation Engineer", "251201, 251202, 351202", 4),
            pos("QA Automation Team Leader", "251206", 1),
            pos("QA Technical Lead", "251201, 351202", 2),
            pos("R&D Group Manager", "251206", 3),
            pos("R&D Team Leader", "122314, 251206", 9),
            pos("Senior Director of Research & Development", "251206", 1),
            pos("Technical Product Owner", "122314, 251206", 2),
        ],
    },
    SeedDepartment {
        name: "Cross Communication",
        positions: &[
            pos("Communication and Brand Manager", "243104", 1),
        ],
    },
    SeedDepartment {
        name: "Cross Finance",
        positions: &[
            pos("Bookkeeper", "263102", 1),
        ],
    },
    SeedDepartment {
        name: "Cross HR",
        positions: &[
            pos("HR Director", "121207", 1),
            pos("HR Operations Specialist", "242314", 2),
            pos("Talent Acquisition Specialist", "242309", 2),
            pos("Talent Acquisition Team Lead", "121207", 1),
        ],
    },
    SeedDepartment {
        name: "Cross Legal & Finance",
        positions: &[
            pos("Chief Accountant", "112020", 1),
            pos("Expert Corporate Counsel", "261103", 1),
        ],
    },
    SeedDepartment {
        name: "Cross Operations",
        positions: &[
            pos("HSE Responsible", "242304", 1),
        ],
    },
    SeedDepartment {
        name: "Cross Slots Central",
        positions: &[
            pos("2D Animator", "251101", 2),
            pos("2D Artist", "251101, 251201, 351202", 5),
            pos("Animator", "251101, 251201", 3),
            pos("Art Director", "251206", 1),
            pos("Art Team Leader", "251206", 2),
            pos("Expert Animator", "351202", 1),
            pos("Expert Artist", "251101, 351202", 2),
            pos("Lead Animator", "251101", 1),
            pos("Product Owner", "251206", 2),
            pos("Product Team Leader", "251206", 1),
            pos("Technical Art Lead", "121904, 251101", 2),
            pos("Technical Artist", "251101", 1),
        ],
    },
    SeedDepartment {
        name: "Cross Technologies",
        positions: &[
            pos("Incident Engineer", "251201, 351202", 2),
            pos("Incident Engineer Expert", "351202", 1),
            pos("IT Service Specialist", "251101, 251203", 2),
            pos("IT System Engineer", "251101", 1),
            pos("Service Operations Analyst", "351202", 1),
            pos("Site Reliability Engineer", "251204", 1),
            pos("SRE Expert", "251204", 1),
            pos("SVP Technologies Program", "251206", 1),
            pos("System Operations Engineer", "351202", 1),
            pos("Tech Project Management Expert", "121904", 1),
            pos("Technical Account Manager", "351202", 1),
            pos("MIS Group Manager", "251206", 1),
        ],
    },
    SeedDepartment {
        name: "HOF (House of Fun)",
        positions: &[
            pos("Manual QA Engineer", "251201", 2),
            pos("Monetization Operation Team Leader", "251206", 1),
            pos("Monetization Operations Lead", "351202", 1),
            pos("Monetization Operations Specialist", "251201", 1),
            pos("QA Technical Lead", "351202", 1),
            pos("Technical Art Lead", "351202", 1),
            pos("Technical Artist", "251101", 1),
        ],
    },
    SeedDepartment {
        name: "SHARED TECH",
        positions: &[
            pos("Director of Architecture", "251101", 1),
        ],
    },
    SeedDepartment {
        name: "WSOP",
        positions: &[
            pos("C# Developer", "251202", 1),
            pos("Full Stack Developer", "251202", 1),
            pos("Java Developer", "251202", 14),
            pos("Java Technical Lead", "251202", 3),
            pos("JavaScript Developer", "251202, 251204", 3),
            pos("JavaScript Technical Lead", "251202", 2),
            pos("Manual QA Engineer", "251201, 351202", 16),
            pos("Monetization Operation Team Leader", "251206", 1),
            pos("QA Automation Engineer", "251202, 351202", 5),
            pos("QA Automation Team Leader", "251206", 1),
            pos("QA Manager", "251206", 1),
            pos("QA Technical Lead", "251201, 351202", 3),
            pos("R&D Director", "251206", 1),
            pos("R&D Group Manager", "251206", 3),
            pos("R&D Team Leader", "251206", 8),
            pos("Release Engineer", "251206", 1),
            pos("Software Architect", "251101", 2),
            pos("Technical Artist", "251101, 351202", 5),
            pos("Technical Product Owner", "251202", 1),
            pos("Unity Developer", "251202, 251204, 351201, 351202", 18),
            pos("Unity Technical Lead", "251202, 251204", 4),
            pos("VP of Research & Development", "112019", 1),
        ],
    },
    SeedDepartment {
        name: "Youda",
        positions: &[
            pos("Product Manager", "251206", 1),
        ],
    },
];
